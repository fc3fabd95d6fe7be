//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::SaleError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Sale coordinator error.
    Sale(SaleError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Sale(err) => sale_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn sale_error_to_response(err: SaleError) -> (StatusCode, String) {
    match &err {
        SaleError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SaleError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        SaleError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SaleError::Store(inner @ StoreError::DuplicateSku { .. }) => {
            (StatusCode::CONFLICT, inner.to_string())
        }
        SaleError::Store(_) | SaleError::Lock(_) => {
            tracing::error!(error = %err, "infrastructure failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        ApiError::Sale(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Sale(SaleError::Store(err))
    }
}
