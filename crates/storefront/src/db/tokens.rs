//! Access token repository.
//!
//! Tokens are stored by SHA-256 hash only; the raw token exists on the
//! client alone.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cartwheel_core::UserId;

use super::RepositoryError;
use super::users::UserRow;
use crate::models::user::User;

/// Repository for bearer token storage.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a (practically impossible) hash collision.
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.access_token (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| super::unique_violation(e, "token"))?;
        Ok(())
    }

    /// The user owning an unexpired token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.first_name, u.last_name, u.email, u.created_at, u.updated_at
            FROM storefront.access_token t
            JOIN storefront.user u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Delete a token.
    ///
    /// # Returns
    ///
    /// Returns `true` if the token existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.access_token WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user's expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM storefront.access_token WHERE user_id = $1 AND expires_at <= $2",
        )
        .bind(user_id)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
