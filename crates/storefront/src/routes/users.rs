//! Account routes: register, login, logout.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiJson, ApiResponse};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{Bearer, RequireUser};
use crate::models::User;
use crate::services::AuthService;
use crate::services::auth::Registration;
use crate::state::AppState;

/// Registration request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    /// Bearer token for the `Authorization` header. Shown only once.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Create an account.
///
/// POST /api/user/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<User>> {
    let auth = AuthService::new(state.pool(), state.config().token_ttl);
    let user = auth
        .register(Registration {
            first_name: &body.first_name,
            last_name: &body.last_name,
            email: &body.email,
            password: &body.password,
        })
        .await?;

    Ok(ApiResponse::ok("User created successfully", user))
}

/// Log in and receive a bearer token.
///
/// POST /api/user/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiResponse<LoginData>> {
    let auth = AuthService::new(state.pool(), state.config().token_ttl);
    let login = auth.login(&body.email, &body.password).await?;

    set_sentry_user(&login.user.id, Some(login.user.email.as_str()));
    add_breadcrumb("auth", "Logged in", None);

    Ok(ApiResponse::ok(
        "Login successful",
        LoginData {
            token: login.token.expose().to_owned(),
            user: login.user,
            expires_at: login.expires_at,
        },
    ))
}

/// Revoke the bearer token used for this request.
///
/// POST /api/user/logout
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Bearer(token): Bearer,
) -> Result<ApiResponse<()>> {
    AuthService::new(state.pool(), state.config().token_ttl)
        .logout(&token)
        .await?;

    tracing::info!("User logged out");
    clear_sentry_user();

    Ok(ApiResponse::empty("Logged out"))
}
