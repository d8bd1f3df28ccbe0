//! # Asset Lending Testing
//!
//! Testing utilities for the asset lending tracker.
//!
//! This crate provides:
//! - [`FixedClock`] and [`test_clock`] for deterministic timestamps
//! - [`InMemoryLendingStore`], a transactional in-memory `LendingStore` with fault injection
//! - [`fixtures`] that seed one user per role, a category and an asset
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - proptest strategies for domain values
//!
//! ## Example
//!
//! ```ignore
//! use asset_lending_testing::{fixtures, test_clock, InMemoryLendingStore};
//!
//! #[tokio::test]
//! async fn accept_decrements() {
//!     let store = Arc::new(InMemoryLendingStore::new());
//!     let seed = fixtures::seed(store.as_ref()).await?;
//!     let service = LendingService::new(store, Arc::new(test_clock()));
//!     // ...
//! }
//! ```

use asset_lending_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod fixtures;
pub mod memory;
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use asset_lending_testing::mocks::FixedClock;
    /// use asset_lending_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a test-friendly tracing subscriber once per process.
    ///
    /// Honors `RUST_LOG`; output goes through the test harness capture.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// Strategies for the closed enumerations and the raw status values a client may send.
pub mod properties {
    use asset_lending_core::types::{RequestStatus, Role};
    use proptest::prelude::*;

    /// Any of the three roles.
    pub fn role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Employee), Just(Role::Manager)]
    }

    /// Any valid status.
    pub fn status() -> impl Strategy<Value = RequestStatus> {
        proptest::sample::select(RequestStatus::ALL.to_vec())
    }

    /// Raw status values, including a margin of out-of-range integers.
    pub fn raw_status() -> impl Strategy<Value = i64> {
        -2_i64..12
    }
}

// Re-export commonly used items
pub use memory::InMemoryLendingStore;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
