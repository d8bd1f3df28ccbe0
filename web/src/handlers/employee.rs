//! Self-scoped views for employees.

use super::PageQuery;
use crate::WebResult;
use crate::extractors::{AuthUser, QueryParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use asset_lending_core::query::{ActivityBucket, Paged};
use asset_lending_core::types::RequestDetail;
use axum::extract::State;

/// `GET /employee/activity`: own requests still in progress.
///
/// # Errors
///
/// 400 on storage failure.
pub async fn activity(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(query): QueryParams<PageQuery>,
) -> WebResult<ApiResponse<Paged<RequestDetail>>> {
    let page = state
        .service
        .employee_requests(&actor, ActivityBucket::Active, query.page())
        .await?;
    Ok(ApiResponse::ok("success get activity", page))
}

/// `GET /employee/history`: own accepted, returning and returned requests.
///
/// # Errors
///
/// 400 on storage failure.
pub async fn history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(query): QueryParams<PageQuery>,
) -> WebResult<ApiResponse<Paged<RequestDetail>>> {
    let page = state
        .service
        .employee_requests(&actor, ActivityBucket::History, query.page())
        .await?;
    Ok(ApiResponse::ok("success get history", page))
}
