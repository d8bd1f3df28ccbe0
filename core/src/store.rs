//! Storage collaborator.
//!
//! A [`LendingStore`] persists requests, assets, categories and the user
//! directory. Its one non-trivial obligation is [`LendingStore::commit`]: every
//! effect produced by a single reduction is applied in one transaction, so a
//! status change and its ledger adjustment land together or not at all.

use crate::effect::Effects;
use crate::error::Result;
use crate::ledger::LedgerOutcome;
use crate::query::{AssetFilter, Page, Paged, RequestFilter, ViewScope};
use crate::types::{
    Asset, AssetId, AssetPatch, AssetSummary, AssetUsage, Category, LoanRequest, NewAsset,
    NewUser, RequestDetail, RequestId, User,
};
use async_trait::async_trait;
use serde::Serialize;

/// What a successful [`LendingStore::commit`] wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Id assigned to an inserted request
    pub inserted: Option<RequestId>,
    /// Result of the ledger effect, if there was one
    pub ledger: Option<LedgerOutcome>,
}

/// Persistence for the lending workflow.
///
/// Soft-deleted rows are invisible to every read.
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// Load a request row.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn find_request(&self, id: RequestId) -> Result<Option<LoanRequest>>;

    /// Load a request joined with borrower, asset, category and status labels.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn request_detail(&self, id: RequestId) -> Result<Option<RequestDetail>>;

    /// Apply all effects of one reduction atomically.
    ///
    /// # Errors
    ///
    /// - `NotFound` when an insert references a missing asset or an update a missing request
    /// - `OutOfStock` when a decrement finds no available units
    /// - `LedgerUpdate` when the quantity write itself fails
    /// - `Persistence` for any other storage failure
    ///
    /// On error nothing is written.
    async fn commit(&self, effects: Effects) -> Result<CommitOutcome>;

    /// Scoped, filtered, ordered and paginated request listing.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn list_requests(
        &self,
        scope: ViewScope,
        filter: &RequestFilter,
    ) -> Result<Paged<RequestDetail>>;

    /// Insert an asset with `available_quantity = initial_quantity`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown category, `Persistence` on storage failure.
    async fn create_asset(&self, asset: NewAsset) -> Result<Asset>;

    /// Load an asset.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn find_asset(&self, id: AssetId) -> Result<Option<Asset>>;

    /// Filtered, paginated asset listing ordered by id.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn list_assets(&self, filter: &AssetFilter) -> Result<Paged<Asset>>;

    /// Apply a partial update. A new initial quantity is applied through
    /// [`Quantities::adjust_initial`](crate::ledger::Quantities::adjust_initial)
    /// while the asset row is locked.
    ///
    /// # Errors
    ///
    /// `NotFound`, `CapacityBelowLoaned`, `Validation` or `Persistence`.
    async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> Result<Asset>;

    /// Fleet-wide quantity totals.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn asset_summary(&self) -> Result<AssetSummary>;

    /// An asset with its paginated request history, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown asset, `Persistence` on storage failure.
    async fn asset_usage(&self, id: AssetId, page: Page) -> Result<AssetUsage>;

    /// All categories ordered by id.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn create_category(&self, name: &str) -> Result<Category>;

    /// Insert a user directory entry.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) on storage failure.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Round-trip to the backing store.
    ///
    /// # Errors
    ///
    /// [`LendingError::Persistence`](crate::LendingError::Persistence) when the store is unreachable.
    async fn health_check(&self) -> Result<()>;
}
