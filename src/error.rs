//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{models::filter::FilterError, store::StorageError, validation::ValidationResult};

/// Application-wide error type.
///
/// Services return `Result<T, AppError>`; handlers pass it through and
/// axum turns it into a response. This is the only place where outcomes
/// become status codes.
///
/// # Error Categories
///
/// - **Validation Errors**: required request fields are missing
/// - **Body Errors**: the request body is not JSON of the expected shape
/// - **Filter Errors**: malformed list query parameters
/// - **Resource Errors**: requested payment or contact does not exist
/// - **Storage Errors**: any failure of the store, after rollback
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body failed validation. Nothing was written.
    ///
    /// Returns HTTP 400 Bad Request with a field → messages map.
    #[error("Validation failed")]
    Validation(ValidationResult),

    /// Request body could not be read as the expected JSON, e.g. a wrong
    /// value type or an unknown charges bearer.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// A list filter could not be parsed.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// Requested entity does not exist.
    ///
    /// Returns HTTP 404 Not Found with an empty body.
    #[error("Not found")]
    NotFound,

    /// Storage failed (connection, constraint, commit).
    ///
    /// Returns HTTP 502 Bad Gateway. The detail is logged, never sent to
    /// the client.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// Validation failures:
/// ```json
/// {
///   "errors": {
///     "paymentCurrency": ["Payment Currency is required"],
///     "beneficiary.address.countryCode": ["Country Code is required"]
///   }
/// }
/// ```
///
/// Other errors (except 404, which has no body):
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(result) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "errors": result.errors })),
                )
                    .into_response();
            }
            AppError::NotFound => return StatusCode::NOT_FOUND.into_response(),
            AppError::InvalidBody(ref rejection) => {
                (StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
            }
            AppError::InvalidFilter(ref err) => {
                (StatusCode::BAD_REQUEST, "invalid_filter", err.to_string())
            }
            AppError::Storage(ref err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "storage_error",
                    "Something went wrong with storing data".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
