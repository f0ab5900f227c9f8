//! Order history.

use sqlx::PgPool;
use tracing::instrument;

use cartwheel_core::{Order, OrderId, UserId};

use crate::db::{OrderRepository, RepositoryError};

/// Read access to a user's own orders.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if storage fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.orders.list_for_user(user_id).await
    }

    /// One order, only if it belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or
    /// belongs to someone else.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId, order_id: OrderId) -> Result<Order, RepositoryError> {
        self.orders
            .get_for_user(user_id, order_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
