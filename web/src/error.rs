//! Error types for web handlers.
//!
//! [`AppError`] bridges [`LendingError`] and HTTP: it picks the status code,
//! renders the envelope body, and logs server-side failures.

use crate::response::Envelope;
use asset_lending_core::error::LendingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> WebResult<ApiResponse<Asset>> {
///     let asset = state.service.asset(id).await?; // LendingError → AppError
///     Ok(ApiResponse::ok("success get asset", asset))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into())
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message.into())
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Envelope `status` label for an HTTP status.
    #[must_use]
    pub fn label(status: StatusCode) -> &'static str {
        match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            s if s.is_client_error() => "failed",
            _ => "error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = Envelope::<()> {
            code: self.status.as_u16(),
            status: Self::label(self.status),
            message: self.message,
            data: None,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map domain failures onto the status codes existing clients expect.
///
/// Authorization failures are 401; everything caused by the input or the
/// stored data, storage failures included, is 400 with the error text.
impl From<LendingError> for AppError {
    fn from(err: LendingError) -> Self {
        match &err {
            LendingError::Unauthorized | LendingError::InvalidTransition { .. } => {
                Self::unauthorized(err.to_string())
            },
            LendingError::Persistence(_) | LendingError::LedgerUpdate(_) => {
                tracing::warn!(error = %err, "Storage failure surfaced to client");
                Self::bad_request(err.to_string())
            },
            LendingError::Validation(_)
            | LendingError::NotFound { .. }
            | LendingError::OutOfStock { .. }
            | LendingError::CapacityBelowLoaned { .. } => Self::bad_request(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_lending_core::types::{AssetId, Role};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("failed to bind data");
        assert_eq!(err.to_string(), "[400] failed to bind data");
    }

    #[test]
    fn authorization_errors_are_401() {
        let err = AppError::from(LendingError::Unauthorized);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "unauthorized access");

        let err = AppError::from(LendingError::InvalidTransition {
            role: Role::Admin,
            requested: 3,
            allowed: Role::Admin.allowed_targets(),
        });
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "id_status must be 2 || 5 || 6 || 7");
    }

    #[test]
    fn data_and_storage_errors_are_400() {
        for err in [
            LendingError::Validation("bad".to_string()),
            LendingError::request_not_found(1),
            LendingError::OutOfStock {
                asset_id: AssetId::new(1),
            },
            LendingError::Persistence("relation \"requests\" does not exist".to_string()),
            LendingError::LedgerUpdate("deadlock detected".to_string()),
        ] {
            let message = err.to_string();
            let app = AppError::from(err);
            assert_eq!(app.status(), StatusCode::BAD_REQUEST);
            assert_eq!(app.message(), message);
        }
    }

    #[test]
    fn source_is_kept_for_logging_but_not_shown() {
        use std::error::Error as _;

        let err = AppError::unavailable("store unavailable")
            .with_source(anyhow::Error::new(LendingError::Persistence("pool timed out".to_string())));

        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message(), "store unavailable");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("pool timed out"));
    }

    #[test]
    fn labels() {
        assert_eq!(AppError::label(StatusCode::UNAUTHORIZED), "unauthorized");
        assert_eq!(AppError::label(StatusCode::BAD_REQUEST), "failed");
        assert_eq!(AppError::label(StatusCode::INTERNAL_SERVER_ERROR), "error");
        assert_eq!(AppError::label(StatusCode::SERVICE_UNAVAILABLE), "error");
    }
}
