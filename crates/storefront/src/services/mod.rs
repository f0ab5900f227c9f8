//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens
//! - `catalog` - Product listing and sample data
//! - `cart` - Cart operations on the user's active cart
//! - `checkout` - Cart to order conversion
//! - `orders` - Order history
//!
//! Services borrow the pool and are built per request from `AppState`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use error::CartServiceError;
pub use orders::OrderService;
