//! Value types for Cartwheel.
//!
//! Type-safe wrappers for IDs, money, quantities, emails, and statuses.

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use quantity::{Quantity, ZeroQuantity};
pub use status::*;
