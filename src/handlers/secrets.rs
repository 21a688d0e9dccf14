//! Secret HTTP handlers.
//!
//! This module implements the secret API endpoints:
//! - POST /v1/secret - Store a new secret
//! - GET /v1/secret/{hash} - Retrieve a secret, consuming one view

use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::secret::{Secret, SecretDraft},
    services::secret_service::SecretService,
};

/// Store a new secret.
///
/// # Request Body (form-encoded)
///
/// ```text
/// secret=hello&expireAfterViews=3&expireAfter=10
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: Returns the created secret
/// - **Error (405)**: Invalid input (bad form body, non-positive views, negative expiry)
/// - **Error (413)**: Body larger than the configured limit
/// - **Error (503)**: Storage unavailable
pub async fn create_secret(
    State(service): State<SecretService>,
    draft: Result<Form<SecretDraft>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(draft) = match draft {
        Ok(draft) => draft,
        // Size limit is a transport problem, not bad input
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Ok(rejection.into_response());
        }
        Err(rejection) => return Err(AppError::Validation(rejection.body_text())),
    };

    let secret = service.create(draft).await?;

    Ok(Json(secret).into_response())
}

/// Retrieve a secret by hash.
///
/// Each successful call consumes one view. The response carries the
/// remaining view count after this retrieval.
///
/// # Response
///
/// - **Success (200 OK)**: Returns the secret
/// - **Error (404)**: Unknown, exhausted or expired; the three are not distinguished
/// - **Error (503)**: Storage unavailable
pub async fn get_secret(
    State(service): State<SecretService>,
    Path(hash): Path<String>,
) -> Result<Json<Secret>, AppError> {
    let secret = service.claim_view(&hash).await?;

    Ok(Json(secret))
}
