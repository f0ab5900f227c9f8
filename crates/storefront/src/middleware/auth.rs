//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <token>`. Every failure
//! (missing or malformed header, unknown or expired token, deleted user)
//! rejects with the same 401 envelope.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService, BearerToken};
use crate::state::AppState;

/// The bearer token presented with the request, unverified.
///
/// # Example
///
/// ```rust,ignore
/// async fn logout(Bearer(token): Bearer) -> impl IntoResponse { ... }
/// ```
pub struct Bearer(pub BearerToken);

impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let user = AuthService::new(state.pool(), state.config().token_ttl)
            .resolve(&token)
            .await
            .map_err(|e| match e {
                AuthError::Unauthorized => AppError::Unauthorized,
                other => AppError::Auth(other),
            })?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Parse `Authorization: Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<BearerToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(BearerToken::from_client(token))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        let token = bearer_token(&headers("Bearer abc")).unwrap();
        assert_eq!(token.expose(), "abc");

        let token = bearer_token(&headers("bearer   abc ")).unwrap();
        assert_eq!(token.expose(), "abc");
    }

    #[test]
    fn test_bearer_token_rejects_malformed() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
        assert!(bearer_token(&headers("Bearer")).is_none());
        assert!(bearer_token(&headers("Bearer ")).is_none());
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_none());
        assert!(bearer_token(&headers("abc")).is_none());
    }
}
