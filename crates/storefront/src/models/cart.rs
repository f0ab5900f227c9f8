//! Cart as returned to the shopper, with each line's product populated.

use serde::Serialize;

use cartwheel_core::{
    Cart, CartId, CartStatus, Inventory, Money, Product, ProductId, Quantity, UserId,
};

/// One cart line with its live product.
///
/// `product` is `None` if the product was deleted after the line was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub unit_price: Money,
    pub quantity: Quantity,
}

/// A cart snapshot for the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub items: Vec<CartLineView>,
    pub total_price: Money,
    pub version: i32,
}

impl CartView {
    /// Build the view of `cart`, taking products from `products`.
    #[must_use]
    pub fn new(cart: &Cart, products: &Inventory) -> Self {
        Self {
            id: cart.id(),
            user_id: cart.user_id(),
            status: cart.status(),
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id,
                    product: products.get(item.product_id).cloned(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                })
                .collect(),
            total_price: cart.total_price(),
            version: cart.version(),
        }
    }
}
