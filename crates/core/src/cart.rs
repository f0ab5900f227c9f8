//! The cart engine.
//!
//! A [`Cart`] belongs to exactly one user and is only ever reached through
//! that user's identity. Every mutation works against an [`Inventory`] of the
//! products involved, so line items and stock counters move together:
//!
//! - `total_price` always equals the sum of `unit_price * quantity`
//! - under [`ReservationPolicy::DebitOnAdd`], a product's stock is its
//!   initial stock minus the quantities held in carts
//! - a failed operation leaves both the cart and the inventory untouched
//!
//! Each successful mutation bumps `version` and returns a [`CartChange`]
//! describing exactly what the storage layer has to write.
//!
//! A cart carries the [`ReservationPolicy`] it was created under and every
//! mutation follows that policy, whatever the current configuration says.

use serde::{Deserialize, Serialize};

use crate::catalog::{Inventory, StockAdjustment};
use crate::error::CartError;
use crate::policy::{ClearPolicy, ReservationPolicy};
use crate::types::{CartId, CartStatus, Money, ProductId, Quantity, UserId};

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    /// Product price when the line was added.
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// What a mutation did to the cart's lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    Added(CartItem),
    Updated {
        product_id: ProductId,
        quantity: Quantity,
    },
    Removed(ProductId),
    Cleared,
}

/// The persisted effect of one successful cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChange {
    pub line: LineChange,
    pub stock: Vec<StockAdjustment>,
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    status: CartStatus,
    #[serde(skip)]
    reservation: ReservationPolicy,
    items: Vec<CartItem>,
    total_price: Money,
    version: i32,
}

impl Cart {
    /// A fresh active cart with no items.
    #[must_use]
    pub const fn new_active(id: CartId, user_id: UserId, reservation: ReservationPolicy) -> Self {
        Self {
            id,
            user_id,
            status: CartStatus::Active,
            reservation,
            items: Vec::new(),
            total_price: Money::ZERO,
            version: 0,
        }
    }

    /// Rebuild a cart from storage. The total is recomputed from `items`.
    #[must_use]
    pub fn restore(
        id: CartId,
        user_id: UserId,
        status: CartStatus,
        reservation: ReservationPolicy,
        items: Vec<CartItem>,
        version: i32,
    ) -> Self {
        let total_price = items.iter().map(CartItem::line_total).sum();
        Self {
            id,
            user_id,
            status,
            reservation,
            items,
            total_price,
            version,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub const fn status(&self) -> CartStatus {
        self.status
    }

    /// The reservation policy the cart was created under.
    #[must_use]
    pub const fn reservation(&self) -> ReservationPolicy {
        self.reservation
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn total_price(&self) -> Money {
        self.total_price
    }

    /// Incremented by every successful mutation.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Product ids referenced by the cart's lines.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.items.iter().map(|item| item.product_id)
    }

    /// Whether the cached total matches the lines.
    #[must_use]
    pub fn total_is_consistent(&self) -> bool {
        self.total_price == self.items.iter().map(CartItem::line_total).sum()
    }

    /// Reject the operation if the caller saw a different version.
    ///
    /// # Errors
    ///
    /// Returns `CartError::VersionMismatch` when `expected` is set and stale.
    pub const fn check_version(&self, expected: Option<i32>) -> Result<(), CartError> {
        match expected {
            Some(expected) if expected != self.version => Err(CartError::VersionMismatch {
                expected,
                actual: self.version,
            }),
            _ => Ok(()),
        }
    }

    /// Add a new line for `product_id`.
    ///
    /// # Errors
    ///
    /// - `DuplicateItem` if the cart already has a line for the product
    /// - `ProductNotFound` if the product is not in `inventory`
    /// - `InsufficientStock` if `quantity` exceeds the product's stock
    pub fn add_item(
        &mut self,
        inventory: &mut Inventory,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartChange, CartError> {
        self.ensure_active()?;
        if self.item(product_id).is_some() {
            return Err(CartError::DuplicateItem(product_id));
        }
        let unit_price = inventory.require(product_id)?.price;

        let stock = if self.reservation.debits_on_mutation() {
            vec![inventory.debit(product_id, quantity.get())?]
        } else {
            inventory.ensure_available(product_id, quantity.get())?;
            Vec::new()
        };

        let item = CartItem {
            product_id,
            unit_price,
            quantity,
        };
        self.items.push(item.clone());
        self.touch();

        Ok(CartChange {
            line: LineChange::Added(item),
            stock,
        })
    }

    /// Set the quantity of an existing line.
    ///
    /// The price stays at the snapshot taken when the line was added.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the cart has no line for the product
    /// - `ProductNotFound` if the product is not in `inventory`
    /// - `InsufficientStock` if the increase exceeds the product's stock
    pub fn update_item(
        &mut self,
        inventory: &mut Inventory,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartChange, CartError> {
        self.ensure_active()?;
        let old_quantity = self
            .item(product_id)
            .map(|item| item.quantity)
            .ok_or(CartError::ItemNotFound(product_id))?;
        inventory.require(product_id)?;

        let stock = if self.reservation.debits_on_mutation() {
            let delta = quantity.delta_from(old_quantity);
            match delta.signum() {
                1 => vec![inventory.debit(product_id, units(delta))?],
                -1 => vec![inventory.credit(product_id, units(delta))?],
                _ => Vec::new(),
            }
        } else {
            inventory.ensure_available(product_id, quantity.get())?;
            Vec::new()
        };

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
        self.touch();

        Ok(CartChange {
            line: LineChange::Updated {
                product_id,
                quantity,
            },
            stock,
        })
    }

    /// Remove a line and return its quantity to stock.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the cart has no line for the product
    /// - `ProductNotFound` if the product is not in `inventory`
    pub fn remove_item(
        &mut self,
        inventory: &mut Inventory,
        product_id: ProductId,
    ) -> Result<CartChange, CartError> {
        self.ensure_active()?;
        let quantity = self
            .item(product_id)
            .map(|item| item.quantity)
            .ok_or(CartError::ItemNotFound(product_id))?;
        inventory.require(product_id)?;

        let stock = if self.reservation.debits_on_mutation() {
            vec![inventory.credit(product_id, quantity.get())?]
        } else {
            Vec::new()
        };

        self.items.retain(|item| item.product_id != product_id);
        self.touch();

        Ok(CartChange {
            line: LineChange::Removed(product_id),
            stock,
        })
    }

    /// Empty the cart.
    ///
    /// Every line's product must still resolve; if one does not, nothing
    /// changes. Stock comes back only if the cart's reservation policy took
    /// it and `on_clear` restores it.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for the first line whose product is missing.
    pub fn clear(
        &mut self,
        inventory: &mut Inventory,
        on_clear: ClearPolicy,
    ) -> Result<CartChange, CartError> {
        self.ensure_active()?;
        for item in &self.items {
            inventory.require(item.product_id)?;
        }

        let mut stock = Vec::new();
        if on_clear.restores(self.reservation) {
            for item in &self.items {
                stock.push(inventory.credit(item.product_id, item.quantity.get())?);
            }
        }

        self.items.clear();
        self.touch();

        Ok(CartChange {
            line: LineChange::Cleared,
            stock,
        })
    }

    /// Close the cart after checkout: no items, zero total, completed.
    pub(crate) fn complete(&mut self) {
        self.items.clear();
        self.status = CartStatus::Completed;
        self.touch();
    }

    pub(crate) const fn ensure_active(&self) -> Result<(), CartError> {
        match self.status {
            CartStatus::Active => Ok(()),
            CartStatus::Completed => Err(CartError::CartNotActive),
        }
    }

    fn touch(&mut self) {
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
        self.version = self.version.wrapping_add(1);
    }
}

fn units(delta: i64) -> u32 {
    u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::Product;
    
    pub(crate) const P: ProductId = ProductId::new(1);
    pub(crate) const Q: ProductId = ProductId::new(2);

    pub(crate) fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    pub(crate) fn money(cents: i64) -> Money {
        Money::from_cents(cents).unwrap()
    }

    /// P(price=10, stock=5) and Q(price=2.50, stock=10).
    pub(crate) fn inventory() -> Inventory {
        [
            Product {
                id: P,
                title: "Lavender Soap".to_string(),
                image: "https://img.example/p.png".to_string(),
                price: money(1000),
                stock: 5,
            },
            Product {
                id: Q,
                title: "Coconut Balm".to_string(),
                image: "https://img.example/q.png".to_string(),
                price: money(250),
                stock: 10,
            },
        ]
        .into_iter()
        .collect()
    }

    pub(crate) fn empty_cart() -> Cart {
        Cart::new_active(CartId::new(1), UserId::new(1), ReservationPolicy::DebitOnAdd)
    }

    pub(crate) fn settling_cart() -> Cart {
        Cart::new_active(CartId::new(2), UserId::new(2), ReservationPolicy::SettleAtCheckout)
    }

    /// Scenario A: add P qty 2.
    pub(crate) fn scenario_a() -> (Cart, Inventory) {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        cart.add_item(&mut inventory, P, qty(2))
            .unwrap();
        (cart, inventory)
    }

    #[test]
    fn test_scenario_a_add_item() {
        let (cart, inventory) = scenario_a();

        assert_eq!(cart.total_price(), money(2000));
        assert_eq!(inventory.stock(P), Some(3));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item(P).unwrap().unit_price, money(1000));
        assert_eq!(cart.version(), 1);
    }

    #[test]
    fn test_scenario_b_update_quantity() {
        let (mut cart, mut inventory) = scenario_a();
        let change = cart.update_item(&mut inventory, P, qty(4)).unwrap();
        assert_eq!(cart.total_price(), money(4000));
        assert_eq!(inventory.stock(P), Some(1));
        assert_eq!(change.stock, vec![StockAdjustment { product_id: P, delta: -2 }]);

        let before = (cart.clone(), inventory.clone());
        let err = cart
            .update_item(&mut inventory, P, qty(10))
            .unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { .. }));
        assert_eq!((cart, inventory), before);
    }

    #[test]
    fn test_update_down_returns_stock() {
        let (mut cart, mut inventory) = scenario_a();
        let change = cart
            .update_item(&mut inventory, P, qty(1))
            .unwrap();

        assert_eq!(cart.total_price(), money(1000));
        assert_eq!(inventory.stock(P), Some(4));
        assert_eq!(change.stock, vec![StockAdjustment { product_id: P, delta: 1 }]);
    }

    #[test]
    fn test_update_keeps_price_snapshot() {
        let (mut cart, mut inventory) = scenario_a();
        let mut repriced: Inventory = inventory.iter().cloned().collect();
        let mut product = repriced.get(P).unwrap().clone();
        product.price = money(9900);
        repriced.insert(product);
        inventory = repriced;

        cart.update_item(&mut inventory, P, qty(3))
            .unwrap();
        assert_eq!(cart.total_price(), money(3000));
    }

    #[test]
    fn test_scenario_c_remove_item() {
        let (mut cart, mut inventory) = scenario_a();
        let change = cart
            .remove_item(&mut inventory, P)
            .unwrap();

        assert_eq!(cart.total_price(), Money::ZERO);
        assert!(cart.items().is_empty());
        assert_eq!(inventory.stock(P), Some(5));
        assert_eq!(change.line, LineChange::Removed(P));
    }

    #[test]
    fn test_scenario_e_duplicate_item() {
        let (mut cart, mut inventory) = scenario_a();
        let before = (cart.clone(), inventory.clone());

        let err = cart
            .add_item(&mut inventory, P, qty(1))
            .unwrap_err();
        assert_eq!(err, CartError::DuplicateItem(P));
        assert_eq!((cart, inventory), before);
    }

    #[test]
    fn test_add_unknown_product() {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        let err = cart
            .add_item(&mut inventory, ProductId::new(99), qty(1))
            .unwrap_err();
        assert_eq!(err, CartError::ProductNotFound(ProductId::new(99)));
        assert!(cart.items().is_empty());
        assert_eq!(cart.version(), 0);
    }

    #[test]
    fn test_add_more_than_stock() {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        let err = cart
            .add_item(&mut inventory, P, qty(6))
            .unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                product_id: P,
                requested: 6,
                available: 5
            }
        );
        assert_eq!(inventory.stock(P), Some(5));
    }

    #[test]
    fn test_add_exactly_all_stock() {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        cart.add_item(&mut inventory, P, qty(5))
            .unwrap();
        assert_eq!(inventory.stock(P), Some(0));
    }

    #[test]
    fn test_update_and_remove_missing_line() {
        let mut cart = empty_cart();
        let mut inventory = inventory();

        assert_eq!(
            cart.update_item(&mut inventory, P, qty(1)),
            Err(CartError::ItemNotFound(P))
        );
        assert_eq!(
            cart.remove_item(&mut inventory, P),
            Err(CartError::ItemNotFound(P))
        );
    }

    #[test]
    fn test_remove_with_deleted_product() {
        let (mut cart, _) = scenario_a();
        let mut without_p: Inventory = inventory().iter().filter(|p| p.id != P).cloned().collect();

        let err = cart
            .remove_item(&mut without_p, P)
            .unwrap_err();
        assert_eq!(err, CartError::ProductNotFound(P));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_clear_restores_stock_by_default() {
        let (mut cart, mut inventory) = scenario_a();
        cart.add_item(&mut inventory, Q, qty(4))
            .unwrap();

        let change = cart.clear(&mut inventory, ClearPolicy::RestoreStock).unwrap();

        assert!(cart.items().is_empty());
        assert_eq!(cart.total_price(), Money::ZERO);
        assert_eq!(inventory.stock(P), Some(5));
        assert_eq!(inventory.stock(Q), Some(10));
        assert_eq!(change.line, LineChange::Cleared);
        assert_eq!(change.stock.len(), 2);
    }

    #[test]
    fn test_clear_can_retain_stock() {
        let (mut cart, mut inventory) = scenario_a();
        let change = cart.clear(&mut inventory, ClearPolicy::RetainStock).unwrap();
        assert!(change.stock.is_empty());
        assert_eq!(inventory.stock(P), Some(3));
    }

    #[test]
    fn test_clear_fails_atomically_on_missing_product() {
        let (mut cart, mut inventory) = scenario_a();
        cart.add_item(&mut inventory, Q, qty(1))
            .unwrap();
        let mut only_p: Inventory = inventory.iter().filter(|p| p.id == P).cloned().collect();
        let before = (cart.clone(), only_p.clone());

        let err = cart.clear(&mut only_p, ClearPolicy::RestoreStock).unwrap_err();
        assert_eq!(err, CartError::ProductNotFound(Q));
        assert_eq!((cart, only_p), before);
    }

    #[test]
    fn test_settle_at_checkout_leaves_stock_alone() {
        let mut cart = settling_cart();
        let mut inventory = inventory();

        let change = cart.add_item(&mut inventory, P, qty(5)).unwrap();
        assert!(change.stock.is_empty());
        assert_eq!(inventory.stock(P), Some(5));

        let err = cart
            .update_item(&mut inventory, P, qty(6))
            .unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { requested: 6, .. }));

        cart.remove_item(&mut inventory, P).unwrap();
        assert_eq!(inventory.stock(P), Some(5));
    }

    #[test]
    fn test_settling_cart_clear_credits_nothing() {
        let mut cart = settling_cart();
        let mut inventory = inventory();
        cart.add_item(&mut inventory, P, qty(2)).unwrap();

        let change = cart.clear(&mut inventory, ClearPolicy::RestoreStock).unwrap();
        assert!(change.stock.is_empty());
        assert_eq!(inventory.stock(P), Some(5));
    }

    #[test]
    fn test_each_cart_keeps_its_own_reservation_policy() {
        // Carts created under different configured policies share one
        // inventory; each must settle by the policy it was created under.
        let mut inventory = inventory();
        let mut debiting = empty_cart();
        let mut settling = settling_cart();

        debiting.add_item(&mut inventory, P, qty(2)).unwrap();
        settling.add_item(&mut inventory, P, qty(2)).unwrap();
        assert_eq!(inventory.stock(P), Some(3));

        // Only the debiting cart's hold is taken out of stock.
        settling.update_item(&mut inventory, P, qty(3)).unwrap();
        debiting.update_item(&mut inventory, P, qty(1)).unwrap();
        assert_eq!(inventory.stock(P), Some(4));

        settling.remove_item(&mut inventory, P).unwrap();
        assert_eq!(inventory.stock(P), Some(4));

        debiting.remove_item(&mut inventory, P).unwrap();
        assert_eq!(inventory.stock(P), Some(5));

        settling.add_item(&mut inventory, Q, qty(4)).unwrap();
        debiting.add_item(&mut inventory, Q, qty(3)).unwrap();
        settling.clear(&mut inventory, ClearPolicy::RestoreStock).unwrap();
        assert_eq!(inventory.stock(Q), Some(7));
        debiting.clear(&mut inventory, ClearPolicy::RestoreStock).unwrap();
        assert_eq!(inventory.stock(Q), Some(10));
    }

    #[test]
    fn test_version_check() {
        let (cart, _) = scenario_a();
        assert!(cart.check_version(None).is_ok());
        assert!(cart.check_version(Some(1)).is_ok());
        assert_eq!(
            cart.check_version(Some(0)),
            Err(CartError::VersionMismatch {
                expected: 0,
                actual: 1
            })
        );
    }

    #[test]
    fn test_completed_cart_rejects_mutation() {
        let (mut cart, mut inventory) = scenario_a();
        cart.complete();
        assert_eq!(
            cart.add_item(&mut inventory, Q, qty(1)),
            Err(CartError::CartNotActive)
        );
    }

    enum Step {
        Add(ProductId, u32),
        Update(ProductId, u32),
        Remove(ProductId),
    }

    #[test]
    fn test_invariants_hold_across_a_mixed_sequence() {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        let initial: Vec<(ProductId, u32)> = inventory.iter().map(|p| (p.id, p.stock)).collect();

        let steps = [
            Step::Add(P, 2),
            Step::Add(Q, 3),
            Step::Add(Q, 1),
            Step::Update(P, 5),
            Step::Update(P, 6),
            Step::Update(Q, 1),
            Step::Remove(P),
            Step::Add(P, 4),
            Step::Remove(ProductId::new(3)),
        ];

        for step in steps {
            let _ = match step {
                Step::Add(id, n) => cart.add_item(&mut inventory, id, qty(n)),
                Step::Update(id, n) => cart.update_item(&mut inventory, id, qty(n)),
                Step::Remove(id) => cart.remove_item(&mut inventory, id),
            };

            assert!(cart.total_is_consistent());
            for (id, start) in &initial {
                let held = cart.item(*id).map_or(0, |item| item.quantity.get());
                assert_eq!(inventory.stock(*id), Some(start - held));
            }
        }
    }

    #[test]
    fn test_restore_recomputes_total() {
        let cart = Cart::restore(
            CartId::new(3),
            UserId::new(4),
            CartStatus::Active,
            ReservationPolicy::SettleAtCheckout,
            vec![
                CartItem {
                    product_id: P,
                    unit_price: money(1000),
                    quantity: qty(2),
                },
                CartItem {
                    product_id: Q,
                    unit_price: money(250),
                    quantity: qty(4),
                },
            ],
            7,
        );
        assert_eq!(cart.total_price(), money(3000));
        assert_eq!(cart.version(), 7);
        assert_eq!(cart.reservation(), ReservationPolicy::SettleAtCheckout);
    }

    #[test]
    fn test_cart_serializes_camel_case() {
        let (cart, _) = scenario_a();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["totalPrice"], "20.00");
        assert_eq!(json["status"], "active");
        assert_eq!(json["items"][0]["productId"], 1);
        assert_eq!(json["items"][0]["unitPrice"], "10.00");
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}
