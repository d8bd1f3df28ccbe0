//! Custom Axum extractors.
//!
//! - `CorrelationId`: request correlation id (set by the middleware or generated)
//! - `BearerToken`: raw token from `Authorization: Bearer <token>`
//! - `AuthUser`: verified caller, resolved through the state's `Authenticator`
//! - `IdPath`: numeric `:id` path segment
//! - `JsonBody` / `QueryParams`: body and query binding whose failures use the envelope
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     AuthUser(actor): AuthUser,
//!     IdPath(id): IdPath,
//!     JsonBody(body): JsonBody<StatusChangeBody>,
//! ) -> WebResult<ApiResponse<StatusChange>> {
//!     ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use asset_lending_core::error::LendingError;
use asset_lending_core::types::Actor;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the id the middleware stored in the request extensions, then the
/// `X-Correlation-ID` header, and generates a UUID v4 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts.extensions.get::<Uuid>().copied().unwrap_or_else(|| {
            parts
                .headers
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4)
        });

        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::from(LendingError::Unauthorized))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::from(LendingError::Unauthorized))?;

        Ok(Self(token.to_string()))
    }
}

/// Authenticated caller.
///
/// Use this as a handler parameter to require a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let actor = state.authenticator.authenticate(&bearer.0)?;
        tracing::debug!(user_id = %actor.user_id, role = %actor.role, "Caller authenticated");
        Ok(Self(actor))
    }
}

/// Numeric `:id` path parameter.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("failed to convert id"))?;
        raw.trim()
            .parse()
            .map(Self)
            .map_err(|_| AppError::bad_request("failed to convert id"))
    }
}

/// JSON request body.
///
/// Malformed JSON, a wrong content type or a type mismatch is a 400
/// `failed to bind data`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(%rejection, "Body rejected");
            AppError::bad_request("failed to bind data")
        })?;
        Ok(Self(value))
    }
}

/// Query-string parameters.
///
/// Uses the same `failed to bind data` rejection as [`JsonBody`].
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "Query string rejected");
                AppError::bad_request("failed to bind data")
            })?;
        Ok(Self(value))
    }
}
