//! Reducer for the request lifecycle.

use super::actions::{LifecycleAction, RequestInput, RequestPatch};
use super::environment::LifecycleEnvironment;
use crate::effect::{Effect, Effects, RequestWrite};
use crate::error::{LendingError, Result};
use crate::ledger::LedgerEffect;
use crate::reducer::Reducer;
use crate::types::{
    Actor, LoanRequest, NewRequest, RequestId, RequestStatus, ReturnDate, Role,
};
use chrono::{DateTime, Utc};
use smallvec::smallvec;

/// Snapshot the reducer works on.
///
/// For a status change the service loads the target request into `request`
/// before reducing; `None` means the row does not exist or is soft-deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifecycleState {
    /// The request being transitioned
    pub request: Option<LoanRequest>,
}

impl LifecycleState {
    /// State holding a loaded request.
    #[must_use]
    pub const fn with_request(request: LoanRequest) -> Self {
        Self {
            request: Some(request),
        }
    }
}

/// Statuses that clear the planned return date.
const SENTINEL_STATUSES: [RequestStatus; 2] = [RequestStatus::Accepted, RequestStatus::Returned];

/// Reducer for request creation and status changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct LifecycleReducer;

impl LifecycleReducer {
    /// Creates a new `LifecycleReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn create(actor: &Actor, input: RequestInput, now: DateTime<Utc>) -> Result<Effects> {
        let (user_id, status) = match actor.role {
            Role::Employee => (actor.user_id, RequestStatus::PendingAdmin),
            Role::Admin => {
                let user_id = input
                    .user_id
                    .filter(|id| id.get() > 0)
                    .ok_or_else(|| LendingError::Validation("id_user is required".to_string()))?;
                (user_id, RequestStatus::PendingManager)
            },
            Role::Manager => return Err(LendingError::Unauthorized),
        };

        if input.asset_id.get() <= 0 {
            return Err(LendingError::Validation("id_asset is required".to_string()));
        }

        let return_date = match non_empty(input.return_date) {
            Some(raw) => ReturnDate::parse(&raw)?,
            None => ReturnDate::sentinel(),
        };

        Ok(smallvec![Effect::InsertRequest(NewRequest {
            user_id,
            asset_id: input.asset_id,
            status,
            return_date,
            description: input.description,
            requested_at: now,
        })])
    }

    fn submit_status_change(
        state: &mut LifecycleState,
        actor_role: Role,
        request_id: RequestId,
        target: i64,
        patch: RequestPatch,
        now: DateTime<Utc>,
    ) -> Result<Effects> {
        let allowed = actor_role.allowed_targets();
        if !allowed.permits(target) {
            return Err(LendingError::InvalidTransition {
                role: actor_role,
                requested: target,
                allowed,
            });
        }
        let status = RequestStatus::try_from(target)?;

        let request = state
            .request
            .as_mut()
            .filter(|request| request.id == request_id)
            .ok_or_else(|| LendingError::request_not_found(request_id.get()))?;

        let asset_id = patch.asset_id.filter(|id| id.get() > 0);
        // Whatever was supplied is discarded for sentinel statuses, even if unparseable.
        let return_date = if SENTINEL_STATUSES.contains(&status) {
            Some(ReturnDate::sentinel())
        } else {
            non_empty(patch.return_date)
                .map(|raw| ReturnDate::parse(&raw))
                .transpose()?
        };
        let description = non_empty(patch.description);

        let write = RequestWrite {
            id: request_id,
            status,
            asset_id,
            return_date,
            description,
            updated_at: now,
        };
        apply_write(request, &write);

        let mut effects: Effects = smallvec![Effect::WriteRequest(write)];
        if let Some(ledger) = LedgerEffect::for_status(request_id, status) {
            effects.push(Effect::Ledger(ledger));
        }
        Ok(effects)
    }
}

impl Reducer for LifecycleReducer {
    type State = LifecycleState;
    type Action = LifecycleAction;
    type Environment = LifecycleEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects> {
        let now = env.clock.now();
        match action {
            LifecycleAction::Create { actor, input } => Self::create(&actor, input, now),
            LifecycleAction::SubmitStatusChange {
                actor_role,
                request_id,
                target,
                patch,
            } => Self::submit_status_change(state, actor_role, request_id, target, patch, now),
        }
    }
}

/// Mirror a write onto an in-memory request, the way the store applies it to the row.
pub fn apply_write(request: &mut LoanRequest, write: &RequestWrite) {
    request.status = write.status;
    if let Some(asset_id) = write.asset_id {
        request.asset_id = asset_id;
    }
    if let Some(return_date) = &write.return_date {
        request.return_date = return_date.clone();
    }
    if let Some(description) = &write.description {
        request.description.clone_from(description);
    }
    request.updated_at = write.updated_at;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

