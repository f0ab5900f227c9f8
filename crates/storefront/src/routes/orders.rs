//! Order history routes.

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use tracing::instrument;

use cartwheel_core::{Order, OrderId};

use super::ApiResponse;
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::OrderService;
use crate::state::AppState;

/// The `{id}` segment of an order route.
///
/// A segment that can't be an order id names no order, so it rejects with
/// the same 404 as an unknown id.
pub struct OrderPath(pub OrderId);

impl<S> FromRequestParts<S> for OrderPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Path::<OrderId>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Self(id))
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "Invalid order id");
                order_not_found()
            })
    }
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// List the user's orders, newest first.
///
/// GET /api/order
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = OrderService::new(state.pool()).list(user.id).await?;
    Ok(ApiResponse::ok("Orders fetched successfully", orders))
}

/// Get one of the user's orders.
///
/// GET /api/order/{id}
#[instrument(skip_all, fields(user_id = %user.id, order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    OrderPath(order_id): OrderPath,
) -> Result<ApiResponse<Order>> {
    let order = OrderService::new(state.pool())
        .get(user.id, order_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            other => AppError::Repository(other),
        })?;
    Ok(ApiResponse::ok("Order fetched successfully", order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/api/order/{id}",
            get(|OrderPath(id): OrderPath| async move { id.to_string() }),
        )
    }

    async fn get_status(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_numeric_id_is_extracted() {
        let (status, body) = get_status("/api/order/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"42");
    }

    #[tokio::test]
    async fn test_malformed_id_is_order_not_found() {
        for uri in ["/api/order/abc", "/api/order/1.5", "/api/order/99999999999"] {
            let (status, body) = get_status(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(
                json,
                serde_json::json!({"message": "Order not found", "data": null})
            );
        }
    }
}
