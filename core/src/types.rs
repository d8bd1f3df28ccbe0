//! Domain types for the asset lending tracker.
//!
//! Identifiers, the closed role and status enumerations, and the records the
//! lifecycle, ledger and query engine operate on. JSON field names follow the
//! wire format existing clients already consume (`id_user`, `avail_quantity`, ...).

use crate::error::{LendingError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a lending request row
    RequestId
);
row_id!(
    /// Identifier of an asset row
    AssetId
);
row_id!(
    /// Identifier of a user (borrower or staff)
    UserId
);
row_id!(
    /// Identifier of an asset category
    CategoryId
);

// ============================================================================
// Role
// ============================================================================

/// Role claim carried by an authenticated caller.
///
/// The numeric values are fixed by the identity provider: 1=Admin, 2=Employee, 3=Manager.
/// Any other value is rejected at conversion time with [`LendingError::Unauthorized`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    /// Inventory administrator
    Admin,
    /// Borrowing employee
    Employee,
    /// Approving manager
    Manager,
}

impl Role {
    /// Numeric claim value.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Admin => 1,
            Self::Employee => 2,
            Self::Manager => 3,
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = LendingError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Admin),
            2 => Ok(Self::Employee),
            3 => Ok(Self::Manager),
            _ => Err(LendingError::Unauthorized),
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Manager => "manager",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Request status
// ============================================================================

/// Position of a request in the approval/return workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RequestStatus {
    /// 1: waiting for admin approval
    PendingAdmin,
    /// 2: waiting for manager approval
    PendingManager,
    /// 3: approved by manager
    ApprovedByManager,
    /// 4: rejected by manager
    RejectedByManager,
    /// 5: rejected by admin
    RejectedByAdmin,
    /// 6: accepted, asset in use
    Accepted,
    /// 7: return requested
    ReturnRequested,
    /// 8: return completed
    Returned,
}

impl RequestStatus {
    /// Every status in ordinal order.
    pub const ALL: [Self; 8] = [
        Self::PendingAdmin,
        Self::PendingManager,
        Self::ApprovedByManager,
        Self::RejectedByManager,
        Self::RejectedByAdmin,
        Self::Accepted,
        Self::ReturnRequested,
        Self::Returned,
    ];

    /// Ordinal stored in the `id_status` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::PendingAdmin => 1,
            Self::PendingManager => 2,
            Self::ApprovedByManager => 3,
            Self::RejectedByManager => 4,
            Self::RejectedByAdmin => 5,
            Self::Accepted => 6,
            Self::ReturnRequested => 7,
            Self::Returned => 8,
        }
    }

    /// Human readable label, as stored in the `status_check` table.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PendingAdmin => "waiting for admin approval",
            Self::PendingManager => "waiting for manager approval",
            Self::ApprovedByManager => "approved by manager",
            Self::RejectedByManager => "rejected by manager",
            Self::RejectedByAdmin => "rejected by admin",
            Self::Accepted => "accepted",
            Self::ReturnRequested => "return requested",
            Self::Returned => "returned",
        }
    }
}

impl TryFrom<i64> for RequestStatus {
    type Error = LendingError;

    fn try_from(value: i64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == value)
            .ok_or_else(|| LendingError::Validation(format!("unknown request status {value}")))
    }
}

impl From<RequestStatus> for i64 {
    fn from(status: RequestStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Return date
// ============================================================================

/// Planned return date of a loan, kept as the `YYYY-MM-DD` text clients send.
///
/// `0000-00-00` marks "no outstanding return date".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnDate(String);

impl ReturnDate {
    /// Placeholder for requests without an outstanding return date.
    pub const SENTINEL: &'static str = "0000-00-00";

    /// The sentinel value.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_string())
    }

    /// Validate client input: a calendar date in `YYYY-MM-DD` form, or the sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] when the text is neither.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == Self::SENTINEL {
            return Ok(Self::sentinel());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| Self(date.format("%Y-%m-%d").to_string()))
            .map_err(|_| LendingError::Validation(format!("invalid return date {raw:?}")))
    }

    /// Wrap a value read back from storage without re-validating it.
    #[must_use]
    pub const fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    /// Whether this is the "no outstanding return date" placeholder.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    /// The date text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReturnDate {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for ReturnDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Actor
// ============================================================================

/// Verified caller identity, supplied by the identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Caller's user id
    pub user_id: UserId,
    /// Caller's email
    pub email: String,
    /// Caller's role
    pub role: Role,
}

// ============================================================================
// Assets, categories, users
// ============================================================================

/// An asset category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: CategoryId,
    /// Category name
    #[serde(rename = "description")]
    pub name: String,
}

/// An owned equipment type with its quantity counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset id
    pub id: AssetId,
    /// Category id
    #[serde(rename = "id_category")]
    pub category_id: CategoryId,
    /// Flagged for maintenance
    pub is_maintenance: bool,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Total owned units
    pub initial_quantity: i32,
    /// Units not currently loaned out
    #[serde(rename = "avail_quantity")]
    pub available_quantity: i32,
    /// Photo URL
    pub photo: String,
    /// Category name
    pub category: String,
}

/// Input for creating an asset. Available quantity starts equal to the initial quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    /// Category id
    #[serde(rename = "id_category")]
    pub category_id: CategoryId,
    /// Flagged for maintenance
    #[serde(default)]
    pub is_maintenance: bool,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Total owned units
    pub initial_quantity: i32,
    /// Photo URL
    #[serde(default)]
    pub photo: String,
}

impl NewAsset {
    /// Check the fields an asset cannot be created without.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] for a blank name, a non-positive category
    /// or a negative quantity.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LendingError::Validation("asset name is required".to_string()));
        }
        if self.category_id.get() <= 0 {
            return Err(LendingError::Validation("id_category is required".to_string()));
        }
        if self.initial_quantity < 0 {
            return Err(LendingError::Validation(
                "initial_quantity must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial asset update. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    #[serde(rename = "id_category")]
    pub category_id: Option<CategoryId>,
    /// New maintenance flag
    pub is_maintenance: Option<bool>,
    /// New initial quantity; the available quantity moves by the same delta
    pub initial_quantity: Option<i32>,
    /// New photo URL
    pub photo: Option<String>,
}

/// A directory entry for a user. Credentials live with the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Division
    pub divisi: String,
    /// Role
    #[serde(rename = "id_role")]
    pub role: Role,
}

/// Input for seeding a directory entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Division
    #[serde(default)]
    pub divisi: String,
    /// Role
    #[serde(rename = "id_role")]
    pub role: Role,
}

// ============================================================================
// Requests
// ============================================================================

/// A persisted lending request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Request id
    pub id: RequestId,
    /// Borrower
    #[serde(rename = "id_user")]
    pub user_id: UserId,
    /// Requested asset
    #[serde(rename = "id_asset")]
    pub asset_id: AssetId,
    /// Workflow status
    #[serde(rename = "id_status")]
    pub status: RequestStatus,
    /// When the request was filed
    pub request_date: DateTime<Utc>,
    /// Planned return date
    pub return_date: ReturnDate,
    /// Free-text description
    pub description: String,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

/// A request row ready to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRequest {
    /// Borrower
    pub user_id: UserId,
    /// Requested asset
    pub asset_id: AssetId,
    /// Initial status (1 or 2)
    pub status: RequestStatus,
    /// Planned return date
    pub return_date: ReturnDate,
    /// Free-text description
    pub description: String,
    /// Filing time
    pub requested_at: DateTime<Utc>,
}

/// A request joined with its borrower, asset, category and status labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetail {
    /// Request id
    pub id: RequestId,
    /// Borrower
    #[serde(rename = "id_user")]
    pub user_id: UserId,
    /// Requested asset
    #[serde(rename = "id_asset")]
    pub asset_id: AssetId,
    /// Workflow status
    #[serde(rename = "id_status")]
    pub status: RequestStatus,
    /// When the request was filed
    pub request_date: DateTime<Utc>,
    /// Planned return date
    pub return_date: ReturnDate,
    /// Free-text description
    pub description: String,
    /// Borrower name
    pub user_name: String,
    /// Asset name
    pub asset_name: String,
    /// Category name
    pub category: String,
    /// Current available quantity of the asset
    #[serde(rename = "avail_quantity")]
    pub available_quantity: i32,
    /// Status label
    #[serde(rename = "status")]
    pub status_description: String,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Asset reports
// ============================================================================

/// Fleet-wide quantity totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    /// Sum of initial quantities
    pub total_asset: i64,
    /// Units on loan (`total_asset - available`)
    #[serde(rename = "use")]
    pub in_use: i64,
    /// Sum of initial quantities of assets flagged for maintenance
    pub maintenance: i64,
    /// Sum of available quantities
    pub available: i64,
}

/// One request in an asset's usage history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Request id
    pub id: RequestId,
    /// Borrower
    #[serde(rename = "id_user")]
    pub user_id: UserId,
    /// Borrower name
    pub name: String,
    /// When the request was filed
    pub request_date: DateTime<Utc>,
    /// Status label
    pub status: String,
}

/// An asset together with the requests made against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUsage {
    /// The asset
    #[serde(flatten)]
    pub asset: Asset,
    /// Requests, newest first
    #[serde(rename = "list_history")]
    pub history: Vec<UsageEntry>,
    /// Page count for the history list
    pub total_page: u64,
}
