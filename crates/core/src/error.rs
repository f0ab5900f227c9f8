//! Business-rule failures of the cart and checkout engines.
//!
//! These are expected outcomes, not faults: the storefront surfaces the
//! `Display` text verbatim to the shopper. Their wording matches what the
//! storefront API has always returned.

use thiserror::Error;

use crate::types::ProductId;

/// A cart or checkout operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product does not exist (or no longer exists).
    #[error("Product not found")]
    ProductNotFound(ProductId),

    /// The cart has no line for the product.
    #[error("Item not found in cart")]
    ItemNotFound(ProductId),

    /// The cart already has a line for the product; update it instead.
    #[error("Item already in cart")]
    DuplicateItem(ProductId),

    /// Not enough stock to cover the requested quantity.
    #[error("Quantity is greater than stock")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Units the operation needed.
        requested: u32,
        /// Units available.
        available: u32,
    },

    /// The user has no active cart to check out.
    #[error("Cart not found")]
    CartNotFound,

    /// Checkout needs a shipping address.
    #[error("Address is required")]
    AddressRequired,

    /// Checkout of a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A zero quantity was supplied.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// The caller's view of the cart is stale.
    #[error("Cart was modified concurrently (expected version {expected}, found {actual})")]
    VersionMismatch {
        /// Version the caller last saw.
        expected: i32,
        /// Version currently stored.
        actual: i32,
    },

    /// The cart is no longer active.
    #[error("Cart is not active")]
    CartNotActive,
}

impl CartError {
    /// Whether retrying after re-reading the cart may succeed.
    ///
    /// A stale version or a cart that was checked out underneath the caller
    /// both resolve once the caller fetches the current active cart.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. } | Self::CartNotActive)
    }
}

impl From<crate::types::ZeroQuantity> for CartError {
    fn from(_: crate::types::ZeroQuantity) -> Self {
        Self::InvalidQuantity
    }
}
