//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{assets, employee, health_check, readiness_check, requests};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (no authentication)
/// - Request lifecycle endpoints
/// - Employee self-service views
/// - Asset and category endpoints
///
/// Every route except the health checks requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let request_routes = Router::new()
        .route(
            "/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/requests/:id",
            get(requests::get_request).put(requests::update_request),
        );

    let employee_routes = Router::new()
        .route("/employee/activity", get(employee::activity))
        .route("/employee/history", get(employee::history))
        .route("/employee/request_loan/:id", get(requests::get_request));

    // Static segments win over `:id` in the matcher, so `/assets/summary`
    // never reaches `get_asset`.
    let asset_routes = Router::new()
        .route(
            "/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route("/assets/summary", get(assets::asset_summary))
        .route(
            "/assets/:id",
            get(assets::get_asset).put(assets::update_asset),
        )
        .route("/assets/:id/usage", get(assets::asset_usage))
        .route("/categories", get(assets::list_categories));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .merge(request_routes)
        .merge(employee_routes)
        .merge(asset_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(CorsLayer::permissive())
}
