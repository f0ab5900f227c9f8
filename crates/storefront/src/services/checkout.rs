//! Checkout service.

use sqlx::PgPool;
use tracing::instrument;

use cartwheel_core::{CartError, LineChange, Order, ProductId, UserId, checkout};

use super::CartServiceError;
use crate::db::{CartRepository, OrderRepository, ProductRepository};

/// Longest accepted `Idempotency-Key`.
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 255;

/// Turns a user's active cart into an order.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check out the user's active cart.
    ///
    /// Stock is settled by the reservation policy stored on the cart, not the
    /// currently configured one.
    ///
    /// With an idempotency key, a repeated request returns the order the
    /// first one created instead of failing on the now-completed cart.
    ///
    /// # Errors
    ///
    /// Returns `CartNotFound`, `AddressRequired`, `EmptyCart`,
    /// `ProductNotFound`, or `InsufficientStock` (carts settled at checkout).
    #[instrument(skip(self, address))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        address: &str,
        idempotency_key: Option<&str>,
    ) -> Result<Order, CartServiceError> {
        let mut tx = self.pool.begin().await?;

        // The cart lock orders concurrent checkouts of the same user, so the
        // replay lookup below sees the first one's order once it commits.
        let cart = CartRepository::lock_active(&mut tx, user_id).await?;

        if let Some(key) = idempotency_key
            && let Some(order) = OrderRepository::find_by_idempotency_key(&mut tx, user_id, key).await?
        {
            tx.commit().await?;
            tracing::info!(order_id = %order.id, "Replayed checkout");
            return Ok(order);
        }

        let mut cart = cart.ok_or(CartError::CartNotFound)?;
        let ids: Vec<ProductId> = cart.product_ids().collect();
        let mut inventory = ProductRepository::lock(&mut tx, &ids).await?;

        let result = checkout(&mut cart, &mut inventory, address)?;

        ProductRepository::apply_adjustments(&mut tx, &result.stock).await?;
        CartRepository::apply(&mut tx, &cart, &LineChange::Cleared).await?;
        let order = OrderRepository::create(&mut tx, &result.order, idempotency_key).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            cart_id = %cart.id(),
            total = %order.total_price,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }
}
