//! Response envelope.
//!
//! Every response body, success or failure, has the shape
//! `{ "code": 200, "status": "success", "message": "...", "data": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Body shape shared by every response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    /// HTTP status code
    pub code: u16,
    /// `success`, `failed`, `unauthorized` or `error`
    pub status: &'static str,
    /// Human-readable outcome
    pub message: String,
    /// Payload, omitted when there is none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Successful handler response.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 200 without a payload.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            code: self.status.as_u16(),
            status: "success",
            message: self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
