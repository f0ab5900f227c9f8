//! Product repository.

use cartwheel_core::{Inventory, Money, Product, ProductId, StockAdjustment};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::{RepositoryError, corrupt};

/// A product to insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub image: String,
    pub price: Money,
    pub stock: u32,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    image: String,
    price: Decimal,
    stock: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            title: row.title,
            image: row.image,
            price: Money::new(row.price).map_err(|e| corrupt("price", e))?,
            stock: u32::try_from(row.stock).map_err(|e| corrupt("stock", e))?,
        })
    }
}

/// Repository for catalog and stock operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, image, price, stock
            FROM storefront.product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let stock = i32::try_from(product.stock)
            .map_err(|_| RepositoryError::Conflict("stock out of range".to_owned()))?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (title, image, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, image, price, stock
            ",
        )
        .bind(&product.title)
        .bind(&product.image)
        .bind(product.price)
        .bind(stock)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Load products without locking them.
    ///
    /// Missing ids are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Inventory, RepositoryError> {
        if ids.is_empty() {
            return Ok(Inventory::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, image, price, stock
            FROM storefront.product
            WHERE id = ANY($1)
            ",
        )
        .bind(raw_ids(ids))
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Load and lock products for the rest of the transaction.
    ///
    /// Rows are locked in id order so that two carts touching the same
    /// products can't deadlock. Missing ids are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Inventory, RepositoryError> {
        if ids.is_empty() {
            return Ok(Inventory::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, image, price, stock
            FROM storefront.product
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(raw_ids(ids))
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Apply stock adjustments produced by the cart or checkout engine.
    ///
    /// Each update only succeeds if stock stays non-negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an adjustment would drive stock
    /// negative or its product disappeared.
    pub async fn apply_adjustments(
        conn: &mut PgConnection,
        adjustments: &[StockAdjustment],
    ) -> Result<(), RepositoryError> {
        for adjustment in adjustments {
            let delta = i32::try_from(adjustment.delta)
                .map_err(|_| RepositoryError::Conflict("stock adjustment out of range".to_owned()))?;

            let result = sqlx::query(
                r"
                UPDATE storefront.product
                SET stock = stock + $2
                WHERE id = $1 AND stock + $2 >= 0
                ",
            )
            .bind(adjustment.product_id)
            .bind(delta)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "stock for product {} changed concurrently",
                    adjustment.product_id
                )));
            }
        }
        Ok(())
    }
}

fn raw_ids(ids: &[ProductId]) -> Vec<i32> {
    let mut raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
    raw.sort_unstable();
    raw.dedup();
    raw
}
