//! Cart and checkout routes.
//!
//! Cart responses carry `ETag: "<version>"`. Mutations accept an optional
//! `If-Match` with that version and fail with 409 if the cart moved on.
//! Checkout accepts an optional `Idempotency-Key`; repeating a request with
//! the same key returns the order the first one created.

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use cartwheel_core::{Order, ProductId};

use super::{ApiJson, ApiPath, ApiResponse};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::services::checkout::MAX_IDEMPOTENCY_KEY_LENGTH;
use crate::services::{CartService, CheckoutService};
use crate::state::AppState;

/// Header carrying the checkout idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Add or update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub address: String,
}

/// Get the active cart, creating it if needed.
///
/// GET /api/cart
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.pool(), state.stock_policy())
        .get_active_cart(user.id)
        .await?;
    Ok(cart_response("Cart found", cart))
}

/// Add a product to the cart.
///
/// POST /api/cart/items
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ItemRequest>,
) -> Result<impl IntoResponse> {
    let expected = expected_version(&headers)?;
    let cart = CartService::new(state.pool(), state.stock_policy())
        .add_item(user.id, body.product_id, body.quantity, expected)
        .await?;

    let product_id = body.product_id.to_string();
    add_breadcrumb("cart", "Added item", Some(&[("product_id", &product_id)]));
    Ok(cart_response("Item added to cart", cart))
}

/// Change the quantity of a cart line.
///
/// PUT /api/cart/items
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ItemRequest>,
) -> Result<impl IntoResponse> {
    let expected = expected_version(&headers)?;
    let cart = CartService::new(state.pool(), state.stock_policy())
        .update_item(user.id, body.product_id, body.quantity, expected)
        .await?;
    Ok(cart_response("Item updated in cart", cart))
}

/// Remove a cart line.
///
/// DELETE /api/cart/items/{productId}
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<impl IntoResponse> {
    let expected = expected_version(&headers)?;
    let cart = CartService::new(state.pool(), state.stock_policy())
        .remove_item(user.id, product_id, expected)
        .await?;
    Ok(cart_response("Item deleted from cart", cart))
}

/// Empty the cart.
///
/// DELETE /api/cart
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let expected = expected_version(&headers)?;
    let cart = CartService::new(state.pool(), state.stock_policy())
        .clear(user.id, expected)
        .await?;
    Ok(cart_response("Cart cleared", cart))
}

/// Turn the cart into an order.
///
/// POST /api/cart/checkout
///
/// A cart with no lines is refused with 400 "Cart is empty" rather than
/// producing an empty order.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<ApiResponse<Order>> {
    let key = idempotency_key(&headers)?;
    let order = CheckoutService::new(state.pool())
        .checkout(user.id, &body.address, key)
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order created", Some(&[("order_id", &order_id)]));
    Ok(ApiResponse::ok("Order created", order))
}

fn cart_response(message: &str, cart: CartView) -> impl IntoResponse + use<> {
    let etag = format!("\"{}\"", cart.version);
    ([(header::ETAG, etag)], ApiResponse::ok(message, cart))
}

/// Parse `If-Match`. Accepts `3`, `"3"`, and `W/"3"`; `*` matches any version.
fn expected_version(headers: &HeaderMap) -> Result<Option<i32>> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let invalid = || AppError::BadRequest("Invalid If-Match header".to_string());

    let raw = value.to_str().map_err(|_| invalid())?.trim();
    if raw == "*" {
        return Ok(None);
    }
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    raw.parse::<i32>().map(Some).map_err(|_| invalid())
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::BadRequest("Invalid Idempotency-Key header".to_string()))?;
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Idempotency-Key must be 1 to {MAX_IDEMPOTENCY_KEY_LENGTH} characters"
        )));
    }
    Ok(Some(key))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_expected_version_forms() {
        assert_eq!(expected_version(&HeaderMap::new()).unwrap(), None);
        assert_eq!(expected_version(&with(header::IF_MATCH, "3")).unwrap(), Some(3));
        assert_eq!(expected_version(&with(header::IF_MATCH, "\"3\"")).unwrap(), Some(3));
        assert_eq!(expected_version(&with(header::IF_MATCH, "W/\"12\"")).unwrap(), Some(12));
        assert_eq!(expected_version(&with(header::IF_MATCH, "*")).unwrap(), None);
    }

    #[test]
    fn test_expected_version_rejects_garbage() {
        assert!(matches!(
            expected_version(&with(header::IF_MATCH, "\"abc\"")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_idempotency_key() {
        let name = header::HeaderName::from_static(IDEMPOTENCY_KEY_HEADER);
        assert_eq!(idempotency_key(&HeaderMap::new()).unwrap(), None);

        let headers = with(name.clone(), " order-1 ");
        assert_eq!(idempotency_key(&headers).unwrap(), Some("order-1"));

        let too_long = "k".repeat(MAX_IDEMPOTENCY_KEY_LENGTH + 1);
        assert!(idempotency_key(&with(name, &too_long)).is_err());
    }

    #[test]
    fn test_item_request_is_camel_case() {
        let body: ItemRequest =
            serde_json::from_str(r#"{"productId": 4, "quantity": 2}"#).unwrap();
        assert_eq!(body.product_id, ProductId::new(4));
        assert_eq!(body.quantity, 2);

        assert!(serde_json::from_str::<ItemRequest>(r#"{"productId": 4, "quantity": -1}"#).is_err());
    }
}
