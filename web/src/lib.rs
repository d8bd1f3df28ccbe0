//! Axum HTTP surface for the asset lending tracker.
//!
//! Handlers are thin: extract the caller and input, call [`LendingService`],
//! and wrap the result in the `{code, status, message, data}` envelope clients
//! already consume.
//!
//! # Request Flow
//!
//! 1. **Correlation layer** tags the request with an `X-Correlation-ID` span
//! 2. **Extract** the bearer token and resolve it to an [`Actor`] via the [`Authenticator`]
//! 3. **Bind** path ids, query strings and JSON bodies (binding failures → 400)
//! 4. **Dispatch** to [`LendingService`]
//! 5. **Map** the result to an [`ApiResponse`] or an [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use asset_lending_web::{AppState, JwtAuthenticator, build_router};
//!
//! let state = AppState::new(service, Arc::new(JwtAuthenticator::new(secret, ttl)));
//! axum::serve(listener, build_router(state)).await?;
//! ```
//!
//! [`LendingService`]: asset_lending_core::service::LendingService
//! [`Actor`]: asset_lending_core::types::Actor

#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use auth::{Authenticator, Claims, JwtAuthenticator};
pub use error::AppError;
pub use extractors::{AuthUser, BearerToken, CorrelationId, IdPath, JsonBody, QueryParams};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use response::ApiResponse;
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
