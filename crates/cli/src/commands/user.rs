//! Shopper account management.

use cartwheel_storefront::services::AuthService;
use cartwheel_storefront::services::auth::Registration;

use super::{CommandError, connect};

/// Create a shopper account with the same validation as the API.
///
/// # Errors
///
/// Returns an error if validation fails, the email is taken, or the
/// database is unreachable.
pub async fn create(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<(), CommandError> {
    let pool = connect().await?;

    // The token lifetime is irrelevant here; no token is issued.
    let auth = AuthService::new(&pool, chrono::Duration::hours(24));
    let user = auth
        .register(Registration {
            first_name,
            last_name,
            email,
            password,
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(())
}
