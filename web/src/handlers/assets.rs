//! Asset and category endpoints.

use super::PageQuery;
use crate::WebResult;
use crate::extractors::{AuthUser, IdPath, JsonBody, QueryParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use asset_lending_core::query::{AssetQuery, Paged};
use asset_lending_core::types::{
    Asset, AssetId, AssetPatch, AssetSummary, AssetUsage, Category, NewAsset,
};
use axum::extract::State;

/// `POST /assets` (admin only)
///
/// # Errors
///
/// 401 for non-admins, 400 for a bad body or unknown category.
pub async fn create_asset(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(asset): JsonBody<NewAsset>,
) -> WebResult<ApiResponse<Asset>> {
    let created = state.service.create_asset(&actor, asset).await?;
    Ok(ApiResponse::ok("success create asset", created))
}

/// `GET /assets`
///
/// # Errors
///
/// 400 for a malformed filter.
pub async fn list_assets(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    QueryParams(query): QueryParams<AssetQuery>,
) -> WebResult<ApiResponse<Paged<Asset>>> {
    let filter = query.into_filter()?;
    let page = state.service.list_assets(&filter).await?;
    Ok(ApiResponse::ok("success get all asset", page))
}

/// `GET /assets/:id`
///
/// # Errors
///
/// 400 for a non-numeric or unknown id.
pub async fn get_asset(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    IdPath(id): IdPath,
) -> WebResult<ApiResponse<Asset>> {
    let asset = state.service.asset(AssetId::new(id)).await?;
    Ok(ApiResponse::ok("success get asset", asset))
}

/// `PUT /assets/:id` (admin only)
///
/// # Errors
///
/// 401 for non-admins; 400 for an unknown asset or a capacity below what is on loan.
pub async fn update_asset(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    IdPath(id): IdPath,
    JsonBody(patch): JsonBody<AssetPatch>,
) -> WebResult<ApiResponse<Asset>> {
    let asset = state
        .service
        .update_asset(&actor, AssetId::new(id), patch)
        .await?;
    Ok(ApiResponse::ok("success update asset", asset))
}

/// `GET /assets/summary`
///
/// # Errors
///
/// 400 on storage failure.
pub async fn asset_summary(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
) -> WebResult<ApiResponse<AssetSummary>> {
    let summary = state.service.asset_summary().await?;
    Ok(ApiResponse::ok("success get summary asset", summary))
}

/// `GET /assets/:id/usage`
///
/// # Errors
///
/// 400 for a non-numeric or unknown id.
pub async fn asset_usage(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    IdPath(id): IdPath,
    QueryParams(query): QueryParams<PageQuery>,
) -> WebResult<ApiResponse<AssetUsage>> {
    let usage = state
        .service
        .asset_usage(AssetId::new(id), query.page())
        .await?;
    Ok(ApiResponse::ok("success get usage asset", usage))
}

/// `GET /categories`
///
/// # Errors
///
/// 400 on storage failure.
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
) -> WebResult<ApiResponse<Vec<Category>>> {
    let categories = state.service.categories().await?;
    Ok(ApiResponse::ok("success get all category", categories))
}
