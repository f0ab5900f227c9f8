//! Cart repository.
//!
//! All functions run on the caller's transaction. Loading the active cart
//! locks its row, which serializes every cart and checkout operation of the
//! same user.
//!
//! A cart's reservation policy is written once, on insert, and never updated.

use cartwheel_core::{
    Cart, CartId, CartItem, CartStatus, LineChange, Money, ProductId, Quantity,
    ReservationPolicy, UserId,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use super::{RepositoryError, corrupt};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    status: CartStatus,
    reservation: ReservationPolicy,
    version: i32,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|e| corrupt("quantity", e))?;
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            unit_price: Money::new(row.unit_price).map_err(|e| corrupt("unit price", e))?,
            quantity: Quantity::new(quantity).map_err(|e| corrupt("quantity", e))?,
        })
    }
}

/// Repository for carts and their lines.
pub struct CartRepository;

impl CartRepository {
    /// Load and lock the user's active cart, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn lock_active(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, status, reservation, version
            FROM storefront.cart
            WHERE user_id = $1 AND status = 'active'
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::hydrate(conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Load and lock the user's active cart, creating an empty one under
    /// `reservation` first if the user has none. An existing cart keeps the
    /// policy it was created with.
    ///
    /// Two concurrent first requests both end up with the same cart: the
    /// partial unique index turns the losing insert into a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create_active(
        conn: &mut PgConnection,
        user_id: UserId,
        reservation: ReservationPolicy,
    ) -> Result<Cart, RepositoryError> {
        if let Some(cart) = Self::lock_active(conn, user_id).await? {
            return Ok(cart);
        }

        let inserted = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO storefront.cart (user_id, reservation)
            VALUES ($1, $2)
            ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(reservation)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = inserted {
            tracing::info!(user_id = %user_id, cart_id = id, %reservation, "Created cart");
            return Ok(Cart::new_active(CartId::new(id), user_id, reservation));
        }

        Self::lock_active(conn, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Persist a mutation: the line change, then the cart's total, version,
    /// and status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart row was not updated.
    pub async fn apply(
        conn: &mut PgConnection,
        cart: &Cart,
        line: &LineChange,
    ) -> Result<(), RepositoryError> {
        match line {
            LineChange::Added(item) => {
                sqlx::query(
                    r"
                    INSERT INTO storefront.cart_item (cart_id, product_id, unit_price, quantity)
                    VALUES ($1, $2, $3, $4)
                    ",
                )
                .bind(cart.id())
                .bind(item.product_id)
                .bind(item.unit_price)
                .bind(quantity_param(item.quantity)?)
                .execute(&mut *conn)
                .await
                .map_err(|e| super::unique_violation(e, "cart item"))?;
            }
            LineChange::Updated {
                product_id,
                quantity,
            } => {
                sqlx::query(
                    r"
                    UPDATE storefront.cart_item
                    SET quantity = $3
                    WHERE cart_id = $1 AND product_id = $2
                    ",
                )
                .bind(cart.id())
                .bind(*product_id)
                .bind(quantity_param(*quantity)?)
                .execute(&mut *conn)
                .await?;
            }
            LineChange::Removed(product_id) => {
                sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1 AND product_id = $2")
                    .bind(cart.id())
                    .bind(*product_id)
                    .execute(&mut *conn)
                    .await?;
            }
            LineChange::Cleared => {
                sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
                    .bind(cart.id())
                    .execute(&mut *conn)
                    .await?;
            }
        }

        let result = sqlx::query(
            r"
            UPDATE storefront.cart
            SET total_price = $2, version = $3, status = $4
            WHERE id = $1
            ",
        )
        .bind(cart.id())
        .bind(cart.total_price())
        .bind(cart.version())
        .bind(cart.status())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "cart {} disappeared during update",
                cart.id()
            )));
        }
        Ok(())
    }

    async fn hydrate(conn: &mut PgConnection, row: CartRow) -> Result<Cart, RepositoryError> {
        let items = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT product_id, unit_price, quantity
            FROM storefront.cart_item
            WHERE cart_id = $1
            ORDER BY position
            ",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(CartItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::restore(
            CartId::new(row.id),
            UserId::new(row.user_id),
            row.status,
            row.reservation,
            items,
            row.version,
        ))
    }
}

fn quantity_param(quantity: Quantity) -> Result<i32, RepositoryError> {
    i32::try_from(quantity.get())
        .map_err(|_| RepositoryError::Conflict("quantity out of range".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_row_conversion() {
        let item = CartItem::try_from(CartItemRow {
            product_id: 3,
            unit_price: Decimal::new(1999, 2),
            quantity: 2,
        })
        .unwrap();
        assert_eq!(item.product_id, ProductId::new(3));
        assert_eq!(item.quantity.get(), 2);
        assert_eq!(item.line_total().to_string(), "39.98");
    }

    #[test]
    fn test_item_row_rejects_zero_quantity() {
        let result = CartItem::try_from(CartItemRow {
            product_id: 3,
            unit_price: Decimal::ONE,
            quantity: 0,
        });
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_quantity_param_out_of_range() {
        assert_eq!(quantity_param(Quantity::new(5).unwrap()).unwrap(), 5);
        assert!(quantity_param(Quantity::new(u32::MAX).unwrap()).is_err());
    }
}
