//! Cart service.
//!
//! Every operation runs in one transaction: lock the user's active cart, lock
//! the products it touches (in id order), run the cart engine, write the
//! change, commit. A refused operation rolls back and leaves nothing behind.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use cartwheel_core::{
    Cart, CartChange, CartError, ClearPolicy, Inventory, ProductId, Quantity, StockPolicy,
    UserId,
};

use super::CartServiceError;
use crate::db::{CartRepository, ProductRepository};
use crate::models::CartView;

/// Cart operations for one authenticated user at a time.
///
/// New carts take the configured reservation policy; existing carts keep
/// their own.
pub struct CartService<'a> {
    pool: &'a PgPool,
    policy: StockPolicy,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StockPolicy) -> Self {
        Self { pool, policy }
    }

    /// The user's active cart, created empty if they have none.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn get_active_cart(&self, user_id: UserId) -> Result<CartView, CartServiceError> {
        let mut tx = self.pool.begin().await?;
        let cart =
            CartRepository::get_or_create_active(&mut tx, user_id, self.policy.reservation).await?;
        let view = view_of(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Add a product line.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem`, `ProductNotFound`, `InsufficientStock`,
    /// `InvalidQuantity`, or `VersionMismatch`.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        expected_version: Option<i32>,
    ) -> Result<CartView, CartServiceError> {
        let quantity = Quantity::new(quantity).map_err(CartError::from)?;
        self.mutate(user_id, expected_version, Some(product_id), |cart, inventory, _| {
            cart.add_item(inventory, product_id, quantity)
        })
        .await
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`, `ProductNotFound`, `InsufficientStock`,
    /// `InvalidQuantity`, or `VersionMismatch`.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        expected_version: Option<i32>,
    ) -> Result<CartView, CartServiceError> {
        let quantity = Quantity::new(quantity).map_err(CartError::from)?;
        self.mutate(user_id, expected_version, Some(product_id), |cart, inventory, _| {
            cart.update_item(inventory, product_id, quantity)
        })
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`, `ProductNotFound`, or `VersionMismatch`.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        expected_version: Option<i32>,
    ) -> Result<CartView, CartServiceError> {
        self.mutate(user_id, expected_version, Some(product_id), |cart, inventory, _| {
            cart.remove_item(inventory, product_id)
        })
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if any line's product is gone, or `VersionMismatch`.
    #[instrument(skip(self))]
    pub async fn clear(
        &self,
        user_id: UserId,
        expected_version: Option<i32>,
    ) -> Result<CartView, CartServiceError> {
        self.mutate(user_id, expected_version, None, |cart, inventory, on_clear| {
            cart.clear(inventory, on_clear)
        })
        .await
    }

    /// Run one engine operation inside a transaction.
    ///
    /// `product` is the product the operation targets; `None` means every
    /// product in the cart.
    async fn mutate<F>(
        &self,
        user_id: UserId,
        expected_version: Option<i32>,
        product: Option<ProductId>,
        op: F,
    ) -> Result<CartView, CartServiceError>
    where
        F: FnOnce(&mut Cart, &mut Inventory, ClearPolicy) -> Result<CartChange, CartError>,
    {
        let mut tx = self.pool.begin().await?;

        let mut cart =
            CartRepository::get_or_create_active(&mut tx, user_id, self.policy.reservation).await?;
        cart.check_version(expected_version)?;

        let ids: Vec<ProductId> = match product {
            Some(id) => vec![id],
            None => cart.product_ids().collect(),
        };
        let mut inventory = ProductRepository::lock(&mut tx, &ids).await?;

        let change = match op(&mut cart, &mut inventory, self.policy.on_clear) {
            Ok(change) => change,
            Err(e) => {
                tracing::debug!(error = %e, "Cart operation refused");
                return Err(e.into());
            }
        };

        CartRepository::apply(&mut tx, &cart, &change.line).await?;
        ProductRepository::apply_adjustments(&mut tx, &change.stock).await?;

        let view = view_of(&mut tx, &cart).await?;
        tx.commit().await?;

        tracing::info!(
            cart_id = %cart.id(),
            version = cart.version(),
            total = %cart.total_price(),
            "Cart updated"
        );
        Ok(view)
    }
}

async fn view_of(conn: &mut PgConnection, cart: &Cart) -> Result<CartView, CartServiceError> {
    let ids: Vec<ProductId> = cart.product_ids().collect();
    let products = ProductRepository::fetch(conn, &ids).await?;
    Ok(CartView::new(cart, &products))
}
