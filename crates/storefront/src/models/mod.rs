//! Domain models for storefront.
//!
//! Catalog, cart, and order types live in `cartwheel-core`; these are the
//! storefront-only shapes built on top of them.

pub mod cart;
pub mod user;

pub use cart::{CartLineView, CartView};
pub use user::User;
