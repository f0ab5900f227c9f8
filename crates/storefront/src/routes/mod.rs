//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (database ping)
//!
//! # Account (rate limited)
//! POST   /api/user/register          - Create account
//! POST   /api/user/login             - Issue bearer token
//! POST   /api/user/logout            - Revoke bearer token (auth)
//!
//! # Catalog
//! GET    /api/product                - Product listing
//!
//! # Cart (auth)
//! GET    /api/cart                   - Active cart
//! DELETE /api/cart                   - Clear cart
//! POST   /api/cart/items             - Add item
//! PUT    /api/cart/items             - Update quantity
//! DELETE /api/cart/items/{productId} - Remove item
//! POST   /api/cart/checkout          - Create order from cart
//!
//! # Orders (auth)
//! GET    /api/order                  - Order history
//! GET    /api/order/{id}             - Order detail
//! ```

pub mod cart;
mod extract;
pub mod health;
pub mod orders;
pub mod products;
mod response;
pub mod users;

pub use extract::{ApiJson, ApiPath};
pub use response::ApiResponse;

use std::time::Duration;

use axum::{
    Router, middleware,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .layer(auth_rate_limiter())
        .route("/logout", post(users::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add).put(cart::update))
        .route("/items/{product_id}", delete(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user_routes())
        .route("/product", get(products::index))
        .nest("/cart", cart_routes())
        .nest("/order", order_routes())
}

/// Build the complete application router.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origin);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::IF_MATCH,
            HeaderName::from_static(cart::IDEMPOTENCY_KEY_HEADER),
        ])
        .expose_headers([header::ETAG])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}
