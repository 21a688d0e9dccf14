//! HTTP request handlers (route handlers).
//!
//! Handlers only translate between HTTP and [`SecretService`]; they make no
//! eligibility decisions of their own.

/// Health check endpoint
pub mod health;
/// Secret create and retrieve endpoints
pub mod secrets;

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::services::secret_service::SecretService;

/// Build the application router.
///
/// # Routes
///
/// - `POST /v1/secret`
/// - `GET /v1/secret/{hash}`
/// - `GET /health`
pub fn router(service: SecretService, request_timeout: Duration, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/secret", post(secrets::create_secret))
        .route("/v1/secret/{hash}", get(secrets::get_secret))
        .route("/health", get(health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(service)
}
