//! Authentication service.
//!
//! Password accounts with opaque bearer tokens.

mod error;
mod token;

pub use error::AuthError;
pub use token::BearerToken;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cartwheel_core::Email;

use crate::db::RepositoryError;
use crate::db::tokens::TokenRepository;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted first or last name.
const MAX_NAME_LENGTH: usize = 100;

/// Registration form.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    pub token: BearerToken,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
///
/// Handles user registration, login, logout, and bearer token resolution.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    token_ttl: chrono::Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, token_ttl: chrono::Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            token_ttl,
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` if a name is blank or too long.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: Registration<'_>) -> Result<User, AuthError> {
        let first_name = validate_name("first name", form.first_name)?;
        let last_name = validate_name("last name", form.last_name)?;
        let email = Email::parse(form.email)?;
        validate_password(form.password)?;

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create_with_password(
                &NewUser {
                    first_name,
                    last_name,
                    email: &email,
                },
                &password_hash,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password, issuing a new bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Login, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let now = Utc::now();
        let pruned = self.tokens.delete_expired_for_user(user.id, now).await?;
        if pruned > 0 {
            tracing::debug!(user_id = %user.id, pruned, "Pruned expired tokens");
        }

        let token = BearerToken::generate();
        let expires_at = now + self.token_ttl;
        self.tokens.create(user.id, &token.hash(), expires_at).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(Login {
            user,
            token,
            expires_at,
        })
    }

    /// Revoke a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn logout(&self, token: &BearerToken) -> Result<(), AuthError> {
        self.tokens.delete(&token.hash()).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` if the token is unknown or expired.
    pub async fn resolve(&self, token: &BearerToken) -> Result<User, AuthError> {
        self.tokens
            .find_user(&token.hash(), Utc::now())
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}

/// Validate a first or last name, returning it trimmed.
fn validate_name<'n>(field: &str, value: &'n str) -> Result<&'n str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidName(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(matches!(
            verify_password("whatever1", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("first name", "  Ada ").unwrap(), "Ada");
        assert!(matches!(
            validate_name("first name", "   "),
            Err(AuthError::InvalidName(msg)) if msg == "first name is required"
        ));
        assert!(validate_name("last name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
