//! Inputs to the lifecycle reducer.

use crate::types::{Actor, AssetId, RequestId, Role, UserId};
use serde::{Deserialize, Serialize};

/// Body of a create-request call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInput {
    /// Borrower; required when an admin files on someone's behalf, ignored for employees
    #[serde(rename = "id_user", default)]
    pub user_id: Option<UserId>,
    /// Requested asset
    #[serde(rename = "id_asset")]
    pub asset_id: AssetId,
    /// Planned return date, `YYYY-MM-DD`
    #[serde(default)]
    pub return_date: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

/// Optional fields that ride along with a status change.
///
/// Zero ids and empty strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPatch {
    /// Replacement asset
    #[serde(rename = "id_asset", default)]
    pub asset_id: Option<AssetId>,
    /// Replacement return date
    #[serde(default)]
    pub return_date: Option<String>,
    /// Replacement description
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything the lifecycle reducer reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleAction {
    /// File a new request
    Create {
        /// Caller
        actor: Actor,
        /// Request body
        input: RequestInput,
    },

    /// Move an existing request to `target`
    SubmitStatusChange {
        /// Caller's role
        actor_role: Role,
        /// Request to update
        request_id: RequestId,
        /// Raw requested status, validated against the role's allowed set
        target: i64,
        /// Fields to overwrite alongside the status
        patch: RequestPatch,
    },
}
