//! Role → target-status authorization table.

use crate::types::{RequestStatus, Role};
use std::fmt;

/// The set of statuses a role may move a request to.
///
/// Displays as the ordinals joined by `" || "`, e.g. `2 || 5 || 6 || 7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowedStatuses(&'static [RequestStatus]);

impl AllowedStatuses {
    /// Whether a raw status value is in the set.
    ///
    /// Values outside the status range are never allowed.
    #[must_use]
    pub fn permits(self, requested: i64) -> bool {
        self.0.iter().any(|status| status.code() == requested)
    }

    /// Statuses in the set.
    #[must_use]
    pub const fn statuses(self) -> &'static [RequestStatus] {
        self.0
    }
}

impl fmt::Display for AllowedStatuses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, status) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{}", status.code())?;
        }
        Ok(())
    }
}

const ADMIN_TARGETS: &[RequestStatus] = &[
    RequestStatus::PendingManager,
    RequestStatus::RejectedByAdmin,
    RequestStatus::Accepted,
    RequestStatus::ReturnRequested,
];

const EMPLOYEE_TARGETS: &[RequestStatus] = &[RequestStatus::Returned];

const MANAGER_TARGETS: &[RequestStatus] = &[
    RequestStatus::ApprovedByManager,
    RequestStatus::RejectedByManager,
];

impl Role {
    /// Statuses this role may set through a status change.
    #[must_use]
    pub const fn allowed_targets(self) -> AllowedStatuses {
        match self {
            Self::Admin => AllowedStatuses(ADMIN_TARGETS),
            Self::Employee => AllowedStatuses(EMPLOYEE_TARGETS),
            Self::Manager => AllowedStatuses(MANAGER_TARGETS),
        }
    }
}
