//! Application state for Axum handlers.

use crate::auth::Authenticator;
use asset_lending_core::service::LendingService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle, ledger and query operations
    pub service: LendingService,
    /// Resolves bearer tokens to callers
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(service: LendingService, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            authenticator,
        }
    }
}
