//! Order repository.

use std::collections::HashMap;

use cartwheel_core::{
    Money, Order, OrderDraft, OrderId, OrderItem, OrderStatus, Quantity, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::{RepositoryError, corrupt};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total_price: Decimal,
    address: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_name: String,
    product_image: String,
    product_price: Decimal,
    product_quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.product_quantity).map_err(|e| corrupt("quantity", e))?;
        Ok(Self {
            product_name: row.product_name,
            product_image: row.product_image,
            product_price: Money::new(row.product_price).map_err(|e| corrupt("price", e))?,
            product_quantity: Quantity::new(quantity).map_err(|e| corrupt("quantity", e))?,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            items,
            total_price: Money::new(self.total_price).map_err(|e| corrupt("total", e))?,
            address: self.address,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, total_price, address, status, created_at, updated_at";

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM storefront."order"
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = load_items(&mut conn, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// One of the user's orders. Orders of other users are never returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM storefront."order"
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(with_items(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    /// The order previously created with this idempotency key, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_idempotency_key(
        conn: &mut PgConnection,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM storefront."order"
            WHERE user_id = $1 AND idempotency_key = $2
            "#
        ))
        .bind(user_id)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(with_items(conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Insert an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the idempotency key was already used.
    pub async fn create(
        conn: &mut PgConnection,
        draft: &OrderDraft,
        idempotency_key: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront."order" (user_id, total_price, address, status, idempotency_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(draft.user_id)
        .bind(draft.total_price)
        .bind(&draft.address)
        .bind(draft.status)
        .bind(idempotency_key)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| super::unique_violation(e, "order for this idempotency key"))?;

        for (position, item) in (0_i32..).zip(&draft.items) {
            let quantity = i32::try_from(item.product_quantity.get())
                .map_err(|_| RepositoryError::Conflict("quantity out of range".to_owned()))?;

            sqlx::query(
                r#"
                INSERT INTO storefront.order_item
                    (order_id, position, product_name, product_image, product_price, product_quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.id)
            .bind(position)
            .bind(&item.product_name)
            .bind(&item.product_image)
            .bind(item.product_price)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
        }

        row.into_order(draft.items.clone())
    }
}

async fn with_items(conn: &mut PgConnection, row: OrderRow) -> Result<Order, RepositoryError> {
    let mut items = load_items(conn, &[row.id]).await?;
    let lines = items.remove(&row.id).unwrap_or_default();
    row.into_order(lines)
}

async fn load_items(
    conn: &mut PgConnection,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
    let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT order_id, product_name, product_image, product_price, product_quantity
        FROM storefront.order_item
        WHERE order_id = ANY($1)
        ORDER BY order_id, position
        ",
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    for row in rows {
        let order_id = row.order_id;
        grouped
            .entry(order_id)
            .or_default()
            .push(OrderItem::try_from(row)?);
    }
    Ok(grouped)
}
