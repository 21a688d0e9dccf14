//! Error types and HTTP error response handling.
//!
//! Every failure the service can produce is one of four kinds. Messages sent
//! to clients are deliberately generic: they never say why input was rejected
//! in detail, and never reveal whether a hash ever existed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Creation input rejected before anything was persisted.
    ///
    /// The String names the offending field for logs only.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A freshly generated hash already exists in storage.
    #[error("Secret hash already exists")]
    Conflict,

    /// The hash is absent, its views are exhausted, or it has expired.
    ///
    /// This is an expected outcome, not a fault.
    #[error("Secret not found")]
    NotEligible,

    /// The persistence layer could not complete the operation.
    #[error("Storage error: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Validation` → 405 Method Not Allowed ("Invalid input")
/// - `NotEligible` → 404 Not Found
/// - `Conflict` → 500 Internal Server Error
/// - `StorageUnavailable` → 503 Service Unavailable (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(reason) => {
                tracing::debug!(%reason, "rejected secret input");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    "invalid_input",
                    "Invalid input",
                )
            }
            AppError::NotEligible => (StatusCode::NOT_FOUND, "secret_not_found", "Secret not found"),
            AppError::Conflict => {
                tracing::error!("hash collision on insert");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "conflict",
                    "An internal error occurred",
                )
            }
            AppError::StorageUnavailable(err) => {
                tracing::error!(error = %err, "storage operation failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_unavailable",
                    "Storage unavailable",
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
