//! The `{ "message": ..., "data": ... }` envelope every endpoint returns.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }

    /// A response without data.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// An error response. Always `data: null`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::empty(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok("Cart found", vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Cart found", "data": [1, 2]}));

        let json = serde_json::to_value(ApiResponse::<()>::empty("Logged out")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Logged out", "data": null}));
    }
}
