//! # Asset Lending Core
//!
//! Domain rules for the asset lending tracker: employees request equipment,
//! managers and admins approve or reject, and inventory quantities move as
//! assets are lent out and returned.
//!
//! ## Core Concepts
//!
//! - **Lifecycle**: role-gated status transitions on a request (`lifecycle`)
//! - **Ledger**: bounded `available_quantity` counter per asset (`ledger`)
//! - **Query**: role-scoped, filtered, paginated request views (`query`)
//! - **Reducer**: pure `(State, Action, Environment) → Effects`
//! - **Effect**: storage writes described as values, committed atomically by a [`store::LendingStore`]
//! - **Service**: the imperative shell that loads state, reduces, and commits (`service`)
//!
//! ## Example
//!
//! ```ignore
//! use asset_lending_core::service::LendingService;
//!
//! let service = LendingService::new(store, clock);
//! let outcome = service.submit_status_change(&actor, request_id, 6, patch).await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod query;
pub mod service;
pub mod store;
pub mod types;

pub use error::{LendingError, Result};

/// Reducer module - pure business logic
///
/// Reducers validate an action against an in-memory snapshot, update the
/// snapshot, and describe the writes that must follow. They never touch storage.
pub mod reducer {
    use super::effect::Effects;
    use crate::error::Result;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for LifecycleReducer {
    ///     type State = LifecycleState;
    ///     type Action = LifecycleAction;
    ///     type Environment = LifecycleEnvironment;
    ///
    ///     fn reduce(&self, state: &mut LifecycleState, action: LifecycleAction, env: &LifecycleEnvironment)
    ///         -> Result<Effects>
    ///     {
    ///         // Business logic here
    ///         Ok(Effects::new())
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// # Errors
        ///
        /// Returns the domain error when the action is rejected. The state is
        /// left untouched in that case and no effects are produced.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects>;
    }
}

/// Effect module - storage writes described as values
///
/// All effects returned by one `reduce` call are handed to
/// [`LendingStore::commit`](crate::store::LendingStore::commit) together and
/// applied inside a single transaction.
pub mod effect {
    use crate::ledger::LedgerEffect;
    use crate::types::{AssetId, NewRequest, RequestId, RequestStatus, ReturnDate};
    use chrono::{DateTime, Utc};
    use smallvec::SmallVec;

    /// Effects produced by a single reduction. Two inline slots cover a status
    /// write plus its ledger adjustment.
    pub type Effects = SmallVec<[Effect; 2]>;

    /// A write the store must perform
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect {
        /// Insert a new request row
        InsertRequest(NewRequest),

        /// Overwrite status and any supplied patch fields of an existing request
        WriteRequest(RequestWrite),

        /// Adjust the available quantity of the asset referenced by a request
        Ledger(LedgerEffect),
    }

    /// Column values for a request update.
    ///
    /// `status` and `updated_at` are always written; `None` fields keep the
    /// stored value.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct RequestWrite {
        /// Request to update
        pub id: RequestId,
        /// New status
        pub status: RequestStatus,
        /// Replacement asset
        pub asset_id: Option<AssetId>,
        /// Replacement return date
        pub return_date: Option<ReturnDate>,
        /// Replacement description
        pub description: Option<String>,
        /// Write time
        pub updated_at: DateTime<Utc>,
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production uses [`SystemClock`]; tests use a fixed clock from the
    /// testing crate.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
