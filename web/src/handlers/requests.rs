//! Loan request endpoints.

use crate::WebResult;
use crate::extractors::{AuthUser, IdPath, JsonBody, QueryParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use asset_lending_core::lifecycle::{RequestInput, RequestPatch};
use asset_lending_core::query::{Paged, RequestQuery};
use asset_lending_core::service::StatusChange;
use asset_lending_core::types::{RequestDetail, RequestId};
use axum::extract::State;
use serde::Deserialize;

/// Body of `PUT /requests/:id`.
///
/// A missing `id_status` reads as 0, which no role may set.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StatusChangeBody {
    /// Requested status
    #[serde(default)]
    pub id_status: i64,
    /// Fields to overwrite alongside the status
    #[serde(flatten)]
    pub patch: RequestPatch,
}

/// `POST /requests`
///
/// # Errors
///
/// 401 for managers, 400 for a bad body or unknown asset.
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(input): JsonBody<RequestInput>,
) -> WebResult<ApiResponse<RequestDetail>> {
    let detail = state.service.create_request(&actor, input).await?;
    Ok(ApiResponse::ok("success create request", detail))
}

/// `GET /requests`
///
/// # Errors
///
/// 400 for an unknown filter keyword.
pub async fn list_requests(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(query): QueryParams<RequestQuery>,
) -> WebResult<ApiResponse<Paged<RequestDetail>>> {
    let filter = query.into_filter()?;
    let page = state.service.list_requests(&actor, &filter).await?;
    Ok(ApiResponse::ok("success get all request", page))
}

/// `GET /requests/:id` and `GET /employee/request_loan/:id`
///
/// # Errors
///
/// 400 for a non-numeric id or a request outside the caller's view.
pub async fn get_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    IdPath(id): IdPath,
) -> WebResult<ApiResponse<RequestDetail>> {
    let detail = state
        .service
        .request_detail(&actor, RequestId::new(id))
        .await?;
    Ok(ApiResponse::ok("success get request", detail))
}

/// `PUT /requests/:id`
///
/// # Errors
///
/// 401 when the role may not set `id_status`; 400 for a missing request,
/// a malformed patch, an out-of-stock asset or a storage failure.
pub async fn update_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    IdPath(id): IdPath,
    JsonBody(body): JsonBody<StatusChangeBody>,
) -> WebResult<ApiResponse<StatusChange>> {
    let change = state
        .service
        .submit_status_change(&actor, RequestId::new(id), body.id_status, body.patch)
        .await?;
    Ok(ApiResponse::ok("success update request", change))
}
