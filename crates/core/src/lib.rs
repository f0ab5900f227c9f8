//! Cartwheel Core - cart and checkout domain library.
//!
//! This crate holds the rules shared by every Cartwheel component:
//! - `storefront` - the shopper-facing HTTP API
//! - `cli` - migrations, seeding, and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no database access, no HTTP. The storefront loads a cart and the products
//! it touches, runs an engine operation here, and persists the resulting
//! [`CartChange`] or [`Checkout`] inside one transaction.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, quantities, emails, and statuses
//! - [`catalog`] - Products and the in-memory stock counters engines move
//! - [`policy`] - When stock is reserved and what clearing a cart returns
//! - [`cart`] - The cart engine
//! - [`checkout`] - Orders and the checkout engine
//! - [`error`] - Business-rule failures

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod policy;
pub mod types;

pub use cart::{Cart, CartChange, CartItem, LineChange};
pub use catalog::{Inventory, Product, StockAdjustment};
pub use checkout::{Checkout, Order, OrderDraft, OrderItem, checkout};
pub use error::CartError;
pub use policy::{ClearPolicy, ParsePolicyError, ReservationPolicy, StockPolicy};
pub use types::*;
