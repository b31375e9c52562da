//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// An error returned to an API caller.
///
/// Serialized as `{"error": {"category": ..., "message": ...}}`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    category: &'static str,
    message: String,
}

impl ApiError {
    /// A 400 for a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            category: "invalid_request",
            message: message.into(),
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error category.
    pub fn category(&self) -> &'static str {
        self.category
    }
}

impl From<adr_core::Error> for ApiError {
    fn from(err: adr_core::Error) -> Self {
        let (status, category) = match &err {
            adr_core::Error::UnknownRecipe { .. } => (StatusCode::NOT_FOUND, "unknown_recipe"),
            adr_core::Error::InvalidOption { .. } => (StatusCode::BAD_REQUEST, "invalid_option"),
            adr_core::Error::Query { .. } => (StatusCode::BAD_GATEWAY, "query"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        Self {
            status,
            category,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(category = self.category, error = %self.message, "Request failed");
        } else {
            tracing::debug!(category = self.category, error = %self.message, "Request rejected");
        }

        let body = json!({
            "error": {
                "category": self.category,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
