//! Catalog listing and sample data.

use sqlx::PgPool;

use cartwheel_core::{Money, Product};

use crate::db::products::NewProduct;
use crate::db::{ProductRepository, RepositoryError};

const SAMPLE_IMAGE: &str = "https://picsum.photos/200/300";

/// Catalog operations.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if storage fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products.list().await
    }

    /// Insert the sample products if the catalog is empty.
    ///
    /// Returns how many products were inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if storage fails.
    pub async fn seed_sample_catalog(&self) -> Result<usize, RepositoryError> {
        if self.products.count().await? > 0 {
            tracing::debug!("Catalog not empty, skipping seed");
            return Ok(0);
        }

        let samples = sample_products();
        for product in &samples {
            let created = self.products.create(product).await?;
            tracing::info!(product_id = %created.id, title = %created.title, "Seeded product");
        }
        Ok(samples.len())
    }
}

/// The three products a fresh store starts with.
#[must_use]
pub fn sample_products() -> Vec<NewProduct> {
    [
        ("Sample Product 1", 999, 100),
        ("Sample Product 2", 1999, 50),
        ("Sample Product 3", 2999, 25),
    ]
    .into_iter()
    .filter_map(|(title, cents, stock)| {
        Money::from_cents(cents).ok().map(|price| NewProduct {
            title: title.to_string(),
            image: SAMPLE_IMAGE.to_string(),
            price,
            stock,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_products() {
        let samples = sample_products();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].price.to_string(), "9.99");
        assert_eq!(samples[1].stock, 50);
        assert_eq!(samples[2].price.to_string(), "29.99");
        assert!(samples.iter().all(|p| p.image == SAMPLE_IMAGE));
    }
}
