//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> ApiResponse<()> {
    ApiResponse::message("ok")
}

/// Health check with a store round-trip (for readiness).
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: it did not
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Errors
///
/// 503 when the store health check fails.
pub async fn readiness_check(
    State(state): State<AppState>,
    CorrelationId(correlation_id): CorrelationId,
) -> Result<ApiResponse<()>, AppError> {
    state.service.health_check().await.map_err(|error| {
        tracing::warn!(%correlation_id, %error, "Readiness check failed");
        AppError::unavailable("store unavailable").with_source(anyhow::Error::new(error))
    })?;
    Ok(ApiResponse::message("ready"))
}
