//! Product catalog route.

use axum::extract::State;
use tracing::instrument;

use cartwheel_core::Product;

use super::ApiResponse;
use crate::error::Result;
use crate::services::CatalogService;
use crate::state::AppState;

/// List all products.
///
/// GET /api/product
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Product>>> {
    let products = CatalogService::new(state.pool()).list_products().await?;
    Ok(ApiResponse::ok("Products fetched successfully", products))
}
