//! Errors shared by the cart, checkout, and order services.

use thiserror::Error;

use cartwheel_core::CartError;

use crate::db::RepositoryError;

/// A cart or checkout operation failed.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// A business rule refused the operation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Storage failed or lost a race.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::from(e))
    }
}
