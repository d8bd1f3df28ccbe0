//! Axum middleware for request tracking and observability.
//!
//! This module provides middleware layers for:
//! - **Correlation ID tracking**: Extract or generate correlation IDs for distributed tracing
//! - **Response headers**: Automatically inject correlation ID into responses
//! - **Tracing integration**: Create spans with correlation context
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use asset_lending_web::middleware::correlation_id_layer;
//!
//! let app = Router::new()
//!     .route("/requests", get(list_requests))
//!     .layer(correlation_id_layer());
//! ```
//!
//! # Flow
//!
//! 1. **Extract** correlation ID from `X-Correlation-ID` header (or generate new UUID)
//! 2. **Store** in request extensions for handler access
//! 3. **Create tracing span** with `correlation_id`, method and path
//! 4. **Log** the response status and latency inside the span
//! 5. **Inject** correlation ID into response `X-Correlation-ID` header

use axum::{
    extract::Request,
    http::HeaderValue,
    response::Response,
};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation ID tracking to all requests.
///
/// Installed by [`build_router`](crate::router::build_router) around every route.
#[must_use]
pub fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Extract correlation ID from header or generate new
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        // Store in request extensions for handler access
        req.extensions_mut().insert(correlation_id);

        // Create tracing span with correlation context
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(async move {
            // Execute request within span
            let mut response = fut.instrument(span.clone()).await?;

            span.in_scope(|| {
                let status = response.status();
                let latency_ms = started.elapsed().as_millis();
                if status.is_server_error() {
                    tracing::error!(%status, latency_ms, "Request failed");
                } else if status.is_client_error() {
                    tracing::warn!(%status, latency_ms, "Request rejected");
                } else {
                    tracing::info!(%status, latency_ms, "Request completed");
                }
            });

            // Inject correlation ID into response header
            if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response
                    .headers_mut()
                    .insert(CORRELATION_ID_HEADER, header_value);
            }

            Ok(response)
        })
    }
}

// Re-export tracing for use with Instrument
use tracing::Instrument;
