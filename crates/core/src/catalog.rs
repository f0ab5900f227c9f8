//! Products and the stock counters the cart engine moves.
//!
//! An [`Inventory`] holds the products a single operation has loaded (in the
//! storefront, the rows it has locked). Engines debit and credit it in memory
//! and report each change as a [`StockAdjustment`] for the persistence layer
//! to apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::types::{Money, ProductId};

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: Money,
    /// Units available to shoppers (not units on hand).
    pub stock: u32,
}

/// A change to one product's stock counter.
///
/// Negative `delta` is a debit, positive a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub delta: i64,
}

/// Products loaded for one operation, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    products: BTreeMap<ProductId, Product>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    /// Look up a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Look up a product, failing with `ProductNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product was not loaded.
    pub fn require(&self, id: ProductId) -> Result<&Product, CartError> {
        self.get(id).ok_or(CartError::ProductNotFound(id))
    }

    /// Current stock of a product, if loaded.
    #[must_use]
    pub fn stock(&self, id: ProductId) -> Option<u32> {
        self.get(id).map(|p| p.stock)
    }

    /// Iterate over the loaded products in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Ensure `units` are available without taking them.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or `InsufficientStock`.
    pub fn ensure_available(&self, id: ProductId, units: u32) -> Result<(), CartError> {
        let product = self.require(id)?;
        if units > product.stock {
            return Err(CartError::InsufficientStock {
                product_id: id,
                requested: units,
                available: product.stock,
            });
        }
        Ok(())
    }

    /// Take `units` out of stock.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or `InsufficientStock`; stock is unchanged on error.
    pub fn debit(&mut self, id: ProductId, units: u32) -> Result<StockAdjustment, CartError> {
        self.ensure_available(id, units)?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or(CartError::ProductNotFound(id))?;
        product.stock -= units;
        Ok(StockAdjustment {
            product_id: id,
            delta: -i64::from(units),
        })
    }

    /// Return `units` to stock.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if the product was not loaded.
    pub fn credit(&mut self, id: ProductId, units: u32) -> Result<StockAdjustment, CartError> {
        let product = self
            .products
            .get_mut(&id)
            .ok_or(CartError::ProductNotFound(id))?;
        product.stock = product.stock.saturating_add(units);
        Ok(StockAdjustment {
            product_id: id,
            delta: i64::from(units),
        })
    }
}

impl FromIterator<Product> for Inventory {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}
