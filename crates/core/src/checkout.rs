//! Orders and the checkout engine.
//!
//! Checkout turns the active cart into an [`OrderDraft`]: every line is
//! snapshotted (name, image, price, quantity) so later catalog edits never
//! rewrite order history, and the cart is closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::catalog::{Inventory, StockAdjustment};
use crate::error::CartError;
use crate::types::{Money, OrderId, OrderStatus, Quantity, UserId};

/// A purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_name: String,
    pub product_image: String,
    pub product_price: Money,
    pub product_quantity: Quantity,
}

/// An order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_price: Money,
    pub address: String,
    pub status: OrderStatus,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_price: Money,
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub order: OrderDraft,
    /// Stock moved by checkout itself. Empty unless stock is settled at
    /// checkout.
    pub stock: Vec<StockAdjustment>,
}

/// Convert `cart` into an order.
///
/// Checks run in this order: cart active, address present, cart not empty,
/// every product resolvable, and (when the cart settles stock at checkout)
/// every line covered. Nothing changes unless all of them pass.
///
/// # Errors
///
/// - `CartNotActive` if the cart was already checked out
/// - `AddressRequired` if `address` is empty or whitespace
/// - `EmptyCart` if the cart has no lines
/// - `ProductNotFound` if a line's product no longer exists
/// - `InsufficientStock` if the cart settles at checkout and a line can't be covered
pub fn checkout(
    cart: &mut Cart,
    inventory: &mut Inventory,
    address: &str,
) -> Result<Checkout, CartError> {
    cart.ensure_active()?;

    let address = address.trim();
    if address.is_empty() {
        return Err(CartError::AddressRequired);
    }
    if cart.items().is_empty() {
        return Err(CartError::EmptyCart);
    }

    let mut items = Vec::with_capacity(cart.items().len());
    for line in cart.items() {
        let product = inventory.require(line.product_id)?;
        items.push(OrderItem {
            product_name: product.title.clone(),
            product_image: product.image.clone(),
            product_price: line.unit_price,
            product_quantity: line.quantity,
        });
    }

    let mut stock = Vec::new();
    if !cart.reservation().debits_on_mutation() {
        for line in cart.items() {
            inventory.ensure_available(line.product_id, line.quantity.get())?;
        }
        for line in cart.items() {
            stock.push(inventory.debit(line.product_id, line.quantity.get())?);
        }
    }

    let order = OrderDraft {
        user_id: cart.user_id(),
        items,
        total_price: cart.total_price(),
        address: address.to_string(),
        status: OrderStatus::Pending,
    };
    cart.complete();

    Ok(Checkout { order, stock })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::{
        P, Q, empty_cart, inventory, money, qty, scenario_a, settling_cart,
    };
    use crate::types::CartStatus;

    #[test]
    fn test_scenario_d_checkout() {
        let (mut cart, mut inventory) = scenario_a();

        let result = checkout(&mut cart, &mut inventory, "1 Main St")
            .unwrap();

        let order = result.order;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, money(2000));
        assert_eq!(order.address, "1 Main St");
        assert_eq!(
            order.items,
            vec![OrderItem {
                product_name: "Lavender Soap".to_string(),
                product_image: "https://img.example/p.png".to_string(),
                product_price: money(1000),
                product_quantity: qty(2),
            }]
        );

        assert!(cart.items().is_empty());
        assert_eq!(cart.total_price(), Money::ZERO);
        assert_eq!(cart.status(), CartStatus::Completed);
        assert!(result.stock.is_empty());
        assert_eq!(inventory.stock(P), Some(3));
    }

    #[test]
    fn test_order_total_matches_item_snapshots() {
        let (mut cart, mut inventory) = scenario_a();
        cart.add_item(&mut inventory, Q, qty(3))
            .unwrap();

        let order = checkout(&mut cart, &mut inventory, "addr")
            .unwrap()
            .order;
        let sum: Money = order
            .items
            .iter()
            .map(|i| i.product_price.times(i.product_quantity))
            .sum();
        assert_eq!(order.total_price, sum);
        assert_eq!(order.total_price, money(2750));
    }

    #[test]
    fn test_blank_address_rejected() {
        let (mut cart, mut inventory) = scenario_a();
        let before = cart.clone();

        for address in ["", "   ", "\t\n"] {
            assert_eq!(
                checkout(&mut cart, &mut inventory, address),
                Err(CartError::AddressRequired)
            );
        }
        assert_eq!(cart, before);
    }

    #[test]
    fn test_address_is_trimmed() {
        let (mut cart, mut inventory) = scenario_a();
        let order = checkout(&mut cart, &mut inventory, "  9 Elm Rd \n")
            .unwrap()
            .order;
        assert_eq!(order.address, "9 Elm Rd");
    }

    #[test]
    fn test_empty_cart_rejected() {
        let mut cart = empty_cart();
        let mut inventory = inventory();
        assert_eq!(
            checkout(&mut cart, &mut inventory, "addr"),
            Err(CartError::EmptyCart)
        );
        assert_eq!(cart.status(), CartStatus::Active);
    }

    #[test]
    fn test_missing_product_aborts_checkout() {
        let (mut cart, _) = scenario_a();
        let mut empty = Inventory::new();
        let before = cart.clone();

        assert_eq!(
            checkout(&mut cart, &mut empty, "addr"),
            Err(CartError::ProductNotFound(P))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_completed_cart_cannot_be_checked_out_twice() {
        let (mut cart, mut inventory) = scenario_a();
        checkout(&mut cart, &mut inventory, "addr").unwrap();
        assert_eq!(
            checkout(&mut cart, &mut inventory, "addr"),
            Err(CartError::CartNotActive)
        );
    }

    #[test]
    fn test_settle_at_checkout_debits_stock() {
        let mut cart = settling_cart();
        let mut inventory = inventory();
        cart.add_item(&mut inventory, P, qty(2)).unwrap();
        cart.add_item(&mut inventory, Q, qty(1)).unwrap();
        assert_eq!(inventory.stock(P), Some(5));

        let result = checkout(&mut cart, &mut inventory, "addr").unwrap();
        assert_eq!(inventory.stock(P), Some(3));
        assert_eq!(inventory.stock(Q), Some(9));
        assert_eq!(result.stock.len(), 2);
    }

    #[test]
    fn test_settle_at_checkout_short_stock_changes_nothing() {
        let mut cart = settling_cart();
        let mut inventory = inventory();
        cart.add_item(&mut inventory, P, qty(2)).unwrap();
        cart.add_item(&mut inventory, Q, qty(4)).unwrap();

        let mut drained: Inventory = inventory
            .iter()
            .cloned()
            .map(|mut p| {
                if p.id == Q {
                    p.stock = 3;
                }
                p
            })
            .collect();
        let before = (cart.clone(), drained.clone());

        let err = checkout(&mut cart, &mut drained, "addr").unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { product_id, .. } if product_id == Q));
        assert_eq!((cart, drained), before);
    }

    #[test]
    fn test_checkout_follows_each_carts_reservation_policy() {
        let mut inventory = inventory();
        let mut debiting = empty_cart();
        let mut settling = settling_cart();
        debiting.add_item(&mut inventory, P, qty(2)).unwrap();
        settling.add_item(&mut inventory, P, qty(1)).unwrap();
        assert_eq!(inventory.stock(P), Some(3));

        // Already debited on add, so checkout moves nothing.
        let result = checkout(&mut debiting, &mut inventory, "addr").unwrap();
        assert!(result.stock.is_empty());
        assert_eq!(inventory.stock(P), Some(3));

        let result = checkout(&mut settling, &mut inventory, "addr").unwrap();
        assert_eq!(result.stock.len(), 1);
        assert_eq!(inventory.stock(P), Some(2));
    }

    #[test]
    fn test_order_serializes_camel_case() {
        let order = Order {
            id: OrderId::new(5),
            user_id: UserId::new(1),
            items: vec![OrderItem {
                product_name: "Lavender Soap".to_string(),
                product_image: "https://img.example/p.png".to_string(),
                product_price: money(1000),
                product_quantity: qty(2),
            }],
            total_price: money(2000),
            address: "1 Main St".to_string(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["totalPrice"], "20.00");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["productName"], "Lavender Soap");
        assert_eq!(json["items"][0]["productQuantity"], 2);
    }
}
