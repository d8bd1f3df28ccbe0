//! Error taxonomy for the lending workflow.
//!
//! Every failure a caller can observe is one of these variants. The web layer maps
//! them onto HTTP status codes; storage implementations map driver errors onto
//! [`LendingError::Persistence`] or [`LendingError::LedgerUpdate`].

use crate::lifecycle::AllowedStatuses;
use crate::types::{AssetId, Role};
use thiserror::Error;

/// Result type alias for lending operations.
pub type Result<T> = std::result::Result<T, LendingError>;

/// Failure modes of the request lifecycle, the inventory ledger and the query engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LendingError {
    /// The actor's role claim is missing, unknown, or not permitted for this action.
    #[error("unauthorized access")]
    Unauthorized,

    /// The requested status is not in the set the actor's role may move a request to.
    #[error("id_status must be {allowed}")]
    InvalidTransition {
        /// Role of the actor attempting the transition
        role: Role,
        /// Raw status value that was requested
        requested: i64,
        /// Statuses the role is allowed to set
        allowed: AllowedStatuses,
    },

    /// Malformed input (ids, dates, filters, bodies).
    #[error("{0}")]
    Validation(String),

    /// A referenced row does not exist or has been soft-deleted.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Kind of record ("request", "asset", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// Accepting a request would drive the asset's available quantity below zero.
    #[error("asset {asset_id} has no available units")]
    OutOfStock {
        /// Asset that ran out
        asset_id: AssetId,
    },

    /// An admin tried to shrink an asset below the number of units currently on loan.
    #[error("initial quantity {requested} is below the {on_loan} units of asset {asset_id} currently on loan")]
    CapacityBelowLoaned {
        /// Asset being edited
        asset_id: AssetId,
        /// Requested new initial quantity
        requested: i32,
        /// Units currently loaned out (`initial - available`)
        on_loan: i32,
    },

    /// Storage read/write failure, surfaced with the driver's message.
    #[error("{0}")]
    Persistence(String),

    /// The quantity write that accompanies a status change failed.
    #[error("{0}")]
    LedgerUpdate(String),
}

impl LendingError {
    /// Shorthand for a missing request row.
    #[must_use]
    pub const fn request_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "request",
            id,
        }
    }

    /// Shorthand for a missing asset row.
    #[must_use]
    pub const fn asset_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "asset",
            id,
        }
    }

    /// Whether the error stems from the caller's authorization rather than the data.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn invalid_transition_names_the_allowed_set() {
        let err = LendingError::InvalidTransition {
            role: Role::Manager,
            requested: 1,
            allowed: Role::Manager.allowed_targets(),
        };
        assert_eq!(err.to_string(), "id_status must be 3 || 4");
        assert!(err.is_authorization());
    }

    #[test]
    fn not_found_display() {
        let err = LendingError::request_not_found(42);
        assert_eq!(err.to_string(), "request with id 42 not found");
        assert!(!err.is_authorization());
    }
}
