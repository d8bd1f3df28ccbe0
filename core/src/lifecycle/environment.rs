//! Environment for the lifecycle reducer.

use crate::environment::Clock;
use std::sync::Arc;

/// Dependencies of [`LifecycleReducer`](super::LifecycleReducer).
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Source of `request_date` and `updated_at`
    pub clock: Arc<dyn Clock>,
}

impl LifecycleEnvironment {
    /// Creates a new `LifecycleEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}
