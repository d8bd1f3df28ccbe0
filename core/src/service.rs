//! Lending service: the imperative shell around the lifecycle reducer.
//!
//! Loads the snapshot a reduction needs, runs the reducer, and hands the
//! resulting effects to [`LendingStore::commit`]. Read paths go straight to
//! the store with the caller's [`ViewScope`] applied.

use crate::environment::Clock;
use crate::error::{LendingError, Result};
use crate::effect::Effect;
use crate::ledger::LedgerOutcome;
use crate::lifecycle::{
    LifecycleAction, LifecycleEnvironment, LifecycleReducer, LifecycleState, RequestInput,
    RequestPatch,
};
use crate::query::{ActivityBucket, AssetFilter, Page, Paged, RequestFilter, ViewScope};
use crate::reducer::Reducer;
use crate::store::LendingStore;
use crate::types::{
    Actor, Asset, AssetId, AssetPatch, AssetSummary, AssetUsage, Category, LoanRequest,
    NewAsset, RequestDetail, RequestId, Role,
};
use serde::Serialize;
use std::sync::Arc;

/// Result of a committed status change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    /// The request as written
    #[serde(flatten)]
    pub request: LoanRequest,
    /// Quantity adjustment that accompanied the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LedgerOutcome>,
}

/// Entry point for every lending operation.
#[derive(Clone)]
pub struct LendingService {
    store: Arc<dyn LendingStore>,
    reducer: LifecycleReducer,
    env: LifecycleEnvironment,
}

impl LendingService {
    /// Creates a new `LendingService`
    #[must_use]
    pub fn new(store: Arc<dyn LendingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            reducer: LifecycleReducer::new(),
            env: LifecycleEnvironment::new(clock),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LendingStore> {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// File a new request.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for managers, `Validation` for a bad body, `NotFound` for
    /// an unknown asset, `Persistence` on storage failure.
    #[tracing::instrument(skip(self, input), fields(user_id = %actor.user_id, role = %actor.role))]
    pub async fn create_request(&self, actor: &Actor, input: RequestInput) -> Result<RequestDetail> {
        let mut state = LifecycleState::default();
        let effects = self
            .reducer
            .reduce(
                &mut state,
                LifecycleAction::Create {
                    actor: actor.clone(),
                    input,
                },
                &self.env,
            )
            .inspect_err(|error| tracing::warn!(%error, "Create request rejected"))?;

        let outcome = self.store.commit(effects).await?;
        let id = outcome.inserted.ok_or_else(|| {
            LendingError::Persistence("insert did not return a request id".to_string())
        })?;
        tracing::info!(request_id = %id, "Request created");

        self.store
            .request_detail(id)
            .await?
            .ok_or_else(|| LendingError::request_not_found(id.get()))
    }

    /// Move a request to `target` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` when `target` is outside the role's allowed set
    /// - `NotFound` for an unknown or deleted request
    /// - `Validation` for a malformed patch
    /// - `OutOfStock` when accepting with no units available
    /// - `LedgerUpdate` / `Persistence` on storage failure; nothing is written
    #[tracing::instrument(skip(self, patch), fields(role = %actor.role))]
    pub async fn submit_status_change(
        &self,
        actor: &Actor,
        request_id: RequestId,
        target: i64,
        patch: RequestPatch,
    ) -> Result<StatusChange> {
        // Authorization does not depend on the row; reject before touching storage.
        let allowed = actor.role.allowed_targets();
        if !allowed.permits(target) {
            tracing::warn!(requested = target, %allowed, "Status change rejected");
            return Err(LendingError::InvalidTransition {
                role: actor.role,
                requested: target,
                allowed,
            });
        }

        let mut state = LifecycleState {
            request: self.store.find_request(request_id).await?,
        };
        let effects = self
            .reducer
            .reduce(
                &mut state,
                LifecycleAction::SubmitStatusChange {
                    actor_role: actor.role,
                    request_id,
                    target,
                    patch,
                },
                &self.env,
            )
            .inspect_err(|error| tracing::warn!(%error, "Status change rejected"))?;

        let has_ledger = effects.iter().any(|e| matches!(e, Effect::Ledger(_)));
        let outcome = self
            .store
            .commit(effects)
            .await
            .inspect_err(|error| tracing::warn!(%error, has_ledger, "Status change not committed"))?;

        let request = state
            .request
            .ok_or_else(|| LendingError::request_not_found(request_id.get()))?;
        tracing::info!(status = %request.status, ledger = ?outcome.ledger, "Status changed");

        Ok(StatusChange {
            request,
            ledger: outcome.ledger,
        })
    }

    // ------------------------------------------------------------------------
    // Request queries
    // ------------------------------------------------------------------------

    /// One request with its joined labels. Employees only see their own.
    ///
    /// # Errors
    ///
    /// `NotFound` when missing or outside the caller's view, `Persistence` on storage failure.
    #[tracing::instrument(skip(self), fields(role = %actor.role))]
    pub async fn request_detail(&self, actor: &Actor, id: RequestId) -> Result<RequestDetail> {
        let detail = self
            .store
            .request_detail(id)
            .await?
            .ok_or_else(|| LendingError::request_not_found(id.get()))?;
        if actor.role == Role::Employee && detail.user_id != actor.user_id {
            return Err(LendingError::request_not_found(id.get()));
        }
        Ok(detail)
    }

    /// Role-scoped request listing.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] on storage failure.
    #[tracing::instrument(skip(self, filter), fields(role = %actor.role))]
    pub async fn list_requests(
        &self,
        actor: &Actor,
        filter: &RequestFilter,
    ) -> Result<Paged<RequestDetail>> {
        self.store
            .list_requests(ViewScope::for_actor(actor), filter)
            .await
    }

    /// The caller's own requests in one bucket, most recently updated first.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] on storage failure.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn employee_requests(
        &self,
        actor: &Actor,
        bucket: ActivityBucket,
        page: Page,
    ) -> Result<Paged<RequestDetail>> {
        let scope = ViewScope::Employee {
            user_id: actor.user_id,
            bucket,
        };
        self.store
            .list_requests(scope, &RequestFilter::page(page))
            .await
    }

    // ------------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------------

    /// Register a new asset. Admin only.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Validation`, `NotFound` (category) or `Persistence`.
    #[tracing::instrument(skip(self, asset), fields(role = %actor.role))]
    pub async fn create_asset(&self, actor: &Actor, asset: NewAsset) -> Result<Asset> {
        require_admin(actor)?;
        asset.validate()?;
        let created = self.store.create_asset(asset).await?;
        tracing::info!(asset_id = %created.id, "Asset created");
        Ok(created)
    }

    /// Partially update an asset. Admin only.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `CapacityBelowLoaned`, `Validation` or `Persistence`.
    #[tracing::instrument(skip(self, patch), fields(role = %actor.role))]
    pub async fn update_asset(&self, actor: &Actor, id: AssetId, patch: AssetPatch) -> Result<Asset> {
        require_admin(actor)?;
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(LendingError::Validation("asset name is required".to_string()));
        }
        let updated = self
            .store
            .update_asset(id, patch)
            .await
            .inspect_err(|error| tracing::warn!(%error, "Asset update rejected"))?;
        tracing::info!(
            asset_id = %id,
            initial = updated.initial_quantity,
            available = updated.available_quantity,
            "Asset updated"
        );
        Ok(updated)
    }

    /// Load one asset.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Persistence`.
    pub async fn asset(&self, id: AssetId) -> Result<Asset> {
        self.store
            .find_asset(id)
            .await?
            .ok_or_else(|| LendingError::asset_not_found(id.get()))
    }

    /// Filtered asset listing.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] on storage failure.
    pub async fn list_assets(&self, filter: &AssetFilter) -> Result<Paged<Asset>> {
        self.store.list_assets(filter).await
    }

    /// Fleet-wide quantity totals.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] on storage failure.
    pub async fn asset_summary(&self) -> Result<AssetSummary> {
        self.store.asset_summary().await
    }

    /// An asset and the requests made against it.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Persistence`.
    pub async fn asset_usage(&self, id: AssetId, page: Page) -> Result<AssetUsage> {
        self.store.asset_usage(id, page).await
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] on storage failure.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }

    /// Store round-trip for readiness probes.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`] when the store is unreachable.
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

fn require_admin(actor: &Actor) -> Result<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        tracing::warn!(role = %actor.role, "Admin-only operation rejected");
        Err(LendingError::Unauthorized)
    }
}
