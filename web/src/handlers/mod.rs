//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod assets;
pub mod employee;
pub mod health;
pub mod requests;

use serde::Deserialize;

/// `limit` / `offset` query parameters, parsed leniently.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page size
    pub limit: Option<String>,
    /// Rows to skip
    pub offset: Option<String>,
}

impl PageQuery {
    /// Malformed or missing values fall back to 0.
    #[must_use]
    pub fn page(&self) -> asset_lending_core::query::Page {
        asset_lending_core::query::Page::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

// Re-export common handler utilities
pub use health::{health_check, readiness_check};
