//! Stock reservation policies.
//!
//! When a shopper's cart takes stock away from other shoppers is a policy
//! decision, not a constant. [`StockPolicy`] bundles the two configured knobs.
//!
//! The reservation policy is fixed per cart when the cart is created and
//! stored with it, so a cart filled under one policy is settled under the same
//! policy even if the configured default changes in between.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// When cart quantities are taken out of the shared stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.stock_reservation", rename_all = "snake_case")
)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationPolicy {
    /// Debit on add, adjust on update, credit on remove. Product stock always
    /// reads as "available to other shoppers". Checkout moves no stock.
    #[default]
    DebitOnAdd,
    /// Add and update only check availability. Stock is debited once, at
    /// checkout, which fails if any line can no longer be covered.
    SettleAtCheckout,
}

impl ReservationPolicy {
    /// Whether cart mutations move stock immediately.
    #[must_use]
    pub const fn debits_on_mutation(self) -> bool {
        matches!(self, Self::DebitOnAdd)
    }
}

/// What clearing a cart does with the stock its lines hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearPolicy {
    /// Credit every line's quantity back, same as removing each line.
    #[default]
    RestoreStock,
    /// Drop the lines without crediting stock.
    RetainStock,
}

impl ClearPolicy {
    /// Whether clearing a cart reserved under `reservation` credits its
    /// lines back. Nothing comes back when nothing was taken.
    #[must_use]
    pub const fn restores(self, reservation: ReservationPolicy) -> bool {
        reservation.debits_on_mutation() && matches!(self, Self::RestoreStock)
    }
}

/// The configured stock rules.
///
/// `reservation` applies to carts created from now on; existing carts keep
/// the policy they were created with. `on_clear` applies to every clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StockPolicy {
    pub reservation: ReservationPolicy,
    pub on_clear: ClearPolicy,
}

/// Error for an unrecognized policy name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown policy '{value}', expected one of: {expected}")]
pub struct ParsePolicyError {
    value: String,
    expected: &'static str,
}

impl FromStr for ReservationPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debit-on-add" => Ok(Self::DebitOnAdd),
            "settle-at-checkout" => Ok(Self::SettleAtCheckout),
            _ => Err(ParsePolicyError {
                value: s.to_string(),
                expected: "debit-on-add, settle-at-checkout",
            }),
        }
    }
}

impl FromStr for ClearPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restore" => Ok(Self::RestoreStock),
            "retain" => Ok(Self::RetainStock),
            _ => Err(ParsePolicyError {
                value: s.to_string(),
                expected: "restore, retain",
            }),
        }
    }
}

impl fmt::Display for ReservationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DebitOnAdd => "debit-on-add",
            Self::SettleAtCheckout => "settle-at-checkout",
        })
    }
}

impl fmt::Display for ClearPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RestoreStock => "restore",
            Self::RetainStock => "retain",
        })
    }
}
