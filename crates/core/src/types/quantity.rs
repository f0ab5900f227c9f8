//! Line-item quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for a zero quantity.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("quantity must be at least 1")]
pub struct ZeroQuantity;

/// The number of units on a cart or order line. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `ZeroQuantity` if `value` is 0.
    pub const fn new(value: u32) -> Result<Self, ZeroQuantity> {
        if value == 0 {
            return Err(ZeroQuantity);
        }
        Ok(Self(value))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Signed difference `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Self) -> i64 {
        i64::from(self.0) - i64::from(other.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = ZeroQuantity;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rejected() {
        assert_eq!(Quantity::new(0), Err(ZeroQuantity));
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_delta() {
        let two = Quantity::new(2).unwrap();
        let five = Quantity::new(5).unwrap();
        assert_eq!(five.delta_from(two), 3);
        assert_eq!(two.delta_from(five), -3);
    }
}
