//! In-memory lending store
//!
//! [`InMemoryLendingStore`] implements [`LendingStore`] over plain maps behind a
//! single lock. A commit works on a copy of the tables and swaps it in only when
//! every effect succeeded, which gives the same all-or-nothing behavior as the
//! `PostgreSQL` transaction. Ledger writes can be made to fail on demand to
//! exercise the rollback path.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use asset_lending_core::effect::{Effect, Effects};
use asset_lending_core::error::{LendingError, Result};
use asset_lending_core::ledger::{LedgerOutcome, Quantities};
use asset_lending_core::lifecycle::reducer::apply_write;
use asset_lending_core::query::{AssetFilter, Page, Paged, RequestFilter, ViewScope};
use asset_lending_core::store::{CommitOutcome, LendingStore};
use asset_lending_core::types::{
    Asset, AssetId, AssetPatch, AssetSummary, AssetUsage, Category, CategoryId, LoanRequest,
    NewAsset, NewUser, RequestDetail, RequestId, User, UsageEntry, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Clone, Debug)]
struct StoredRequest {
    request: LoanRequest,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    users: BTreeMap<UserId, User>,
    assets: BTreeMap<AssetId, Asset>,
    requests: BTreeMap<RequestId, StoredRequest>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_request(&self, id: RequestId) -> Option<&LoanRequest> {
        self.requests
            .get(&id)
            .filter(|stored| stored.deleted_at.is_none())
            .map(|stored| &stored.request)
    }

    fn detail(&self, request: &LoanRequest) -> RequestDetail {
        let asset = self.assets.get(&request.asset_id);
        RequestDetail {
            id: request.id,
            user_id: request.user_id,
            asset_id: request.asset_id,
            status: request.status,
            request_date: request.request_date,
            return_date: request.return_date.clone(),
            description: request.description.clone(),
            user_name: self
                .users
                .get(&request.user_id)
                .map(|user| user.name.clone())
                .unwrap_or_default(),
            asset_name: asset.map(|a| a.name.clone()).unwrap_or_default(),
            category: asset.map(|a| a.category.clone()).unwrap_or_default(),
            available_quantity: asset.map_or(0, |a| a.available_quantity),
            status_description: request.status.description().to_string(),
            updated_at: request.updated_at,
        }
    }

    fn category_name(&self, id: CategoryId) -> Result<String> {
        self.categories
            .get(&id)
            .map(|c| c.name.clone())
            .ok_or(LendingError::NotFound {
                resource: "category",
                id: id.get(),
            })
    }

    fn apply(&mut self, effect: Effect, fail_ledger: bool, outcome: &mut CommitOutcome) -> Result<()> {
        match effect {
            Effect::InsertRequest(new) => {
                if !self.assets.contains_key(&new.asset_id) {
                    return Err(LendingError::asset_not_found(new.asset_id.get()));
                }
                let id = RequestId::new(self.next_id());
                let request = LoanRequest {
                    id,
                    user_id: new.user_id,
                    asset_id: new.asset_id,
                    status: new.status,
                    request_date: new.requested_at,
                    return_date: new.return_date,
                    description: new.description,
                    updated_at: new.requested_at,
                };
                self.requests.insert(
                    id,
                    StoredRequest {
                        request,
                        deleted_at: None,
                    },
                );
                outcome.inserted = Some(id);
            },
            Effect::WriteRequest(write) => {
                if let Some(asset_id) = write.asset_id {
                    if !self.assets.contains_key(&asset_id) {
                        return Err(LendingError::asset_not_found(asset_id.get()));
                    }
                }
                let stored = self
                    .requests
                    .get_mut(&write.id)
                    .filter(|stored| stored.deleted_at.is_none())
                    .ok_or_else(|| LendingError::request_not_found(write.id.get()))?;
                apply_write(&mut stored.request, &write);
            },
            Effect::Ledger(ledger) => {
                if fail_ledger {
                    return Err(LendingError::LedgerUpdate(
                        "injected ledger write failure".to_string(),
                    ));
                }
                let request_id = ledger.request_id();
                let asset_id = self
                    .live_request(request_id)
                    .map(|request| request.asset_id)
                    .ok_or_else(|| LendingError::request_not_found(request_id.get()))?;
                let asset = self
                    .assets
                    .get_mut(&asset_id)
                    .ok_or_else(|| LendingError::asset_not_found(asset_id.get()))?;
                let quantities = Quantities::new(asset.initial_quantity, asset.available_quantity)
                    .map_err(|e| LendingError::LedgerUpdate(e.to_string()))?;
                let (next, result) = LedgerOutcome::apply(ledger, asset_id, quantities)?;
                asset.available_quantity = next.available();
                outcome.ledger = Some(result);
            },
        }
        Ok(())
    }
}

/// `LendingStore` backed by in-process maps.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryLendingStore::new();
/// let category = store.create_category("Electronics").await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryLendingStore {
    tables: Arc<RwLock<Tables>>,
    fail_ledger_writes: Arc<AtomicBool>,
    fail_all: Arc<AtomicBool>,
}

impl InMemoryLendingStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent ledger effect fail with `LedgerUpdate`.
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent call fail with `Persistence`, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_all.store(unavailable, Ordering::SeqCst);
    }

    /// Mark a request as deleted. Deleted requests are invisible to every read.
    pub fn soft_delete_request(&self, id: RequestId, at: DateTime<Utc>) -> bool {
        let mut tables = self.tables.write().unwrap();
        tables
            .requests
            .get_mut(&id)
            .map(|stored| stored.deleted_at = Some(at))
            .is_some()
    }

    /// Current shelf count of an asset, for assertions.
    #[must_use]
    pub fn available_quantity(&self, id: AssetId) -> Option<i32> {
        self.tables
            .read()
            .unwrap()
            .assets
            .get(&id)
            .map(|asset| asset.available_quantity)
    }

    /// Number of stored requests, deleted ones included.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.tables.read().unwrap().requests.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(LendingError::Persistence(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LendingStore for InMemoryLendingStore {
    async fn find_request(&self, id: RequestId) -> Result<Option<LoanRequest>> {
        self.check_available()?;
        Ok(self.tables.read().unwrap().live_request(id).cloned())
    }

    async fn request_detail(&self, id: RequestId) -> Result<Option<RequestDetail>> {
        self.check_available()?;
        let tables = self.tables.read().unwrap();
        Ok(tables.live_request(id).map(|request| tables.detail(request)))
    }

    async fn commit(&self, effects: Effects) -> Result<CommitOutcome> {
        self.check_available()?;
        let fail_ledger = self.fail_ledger_writes.load(Ordering::SeqCst);

        let mut tables = self.tables.write().unwrap();
        let mut working = tables.clone();
        let mut outcome = CommitOutcome::default();
        for effect in effects {
            working.apply(effect, fail_ledger, &mut outcome)?;
        }
        *tables = working;
        Ok(outcome)
    }

    async fn list_requests(
        &self,
        scope: ViewScope,
        filter: &RequestFilter,
    ) -> Result<Paged<RequestDetail>> {
        self.check_available()?;
        let tables = self.tables.read().unwrap();
        let rows = tables
            .requests
            .values()
            .filter(|stored| stored.deleted_at.is_none())
            .map(|stored| tables.detail(&stored.request))
            .collect();
        Ok(filter.apply(scope, rows))
    }

    async fn create_asset(&self, asset: NewAsset) -> Result<Asset> {
        self.check_available()?;
        let quantities = Quantities::full(asset.initial_quantity)?;
        let mut tables = self.tables.write().unwrap();
        let category = tables.category_name(asset.category_id)?;
        let id = AssetId::new(tables.next_id());
        let created = Asset {
            id,
            category_id: asset.category_id,
            is_maintenance: asset.is_maintenance,
            name: asset.name,
            description: asset.description,
            initial_quantity: quantities.initial(),
            available_quantity: quantities.available(),
            photo: asset.photo,
            category,
        };
        tables.assets.insert(id, created.clone());
        Ok(created)
    }

    async fn find_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        self.check_available()?;
        Ok(self.tables.read().unwrap().assets.get(&id).cloned())
    }

    async fn list_assets(&self, filter: &AssetFilter) -> Result<Paged<Asset>> {
        self.check_available()?;
        let tables = self.tables.read().unwrap();
        let rows: Vec<Asset> = tables
            .assets
            .values()
            .filter(|asset| filter.matches(asset))
            .cloned()
            .collect();
        let total = rows.len() as u64;
        Ok(Paged::new(filter.page.slice(rows), total, filter.page))
    }

    async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> Result<Asset> {
        self.check_available()?;
        let mut tables = self.tables.write().unwrap();
        let category = patch
            .category_id
            .map(|category_id| tables.category_name(category_id))
            .transpose()?;
        let asset = tables
            .assets
            .get_mut(&id)
            .ok_or_else(|| LendingError::asset_not_found(id.get()))?;

        if let Some(new_initial) = patch.initial_quantity {
            let adjusted = Quantities::new(asset.initial_quantity, asset.available_quantity)?
                .adjust_initial(id, new_initial)?;
            asset.initial_quantity = adjusted.initial();
            asset.available_quantity = adjusted.available();
        }
        if let (Some(category_id), Some(name)) = (patch.category_id, category) {
            asset.category_id = category_id;
            asset.category = name;
        }
        if let Some(name) = patch.name {
            asset.name = name;
        }
        if let Some(description) = patch.description {
            asset.description = description;
        }
        if let Some(flag) = patch.is_maintenance {
            asset.is_maintenance = flag;
        }
        if let Some(photo) = patch.photo {
            asset.photo = photo;
        }
        Ok(asset.clone())
    }

    async fn asset_summary(&self) -> Result<AssetSummary> {
        self.check_available()?;
        let tables = self.tables.read().unwrap();
        let mut summary = AssetSummary::default();
        for asset in tables.assets.values() {
            summary.total_asset += i64::from(asset.initial_quantity);
            summary.available += i64::from(asset.available_quantity);
            if asset.is_maintenance {
                summary.maintenance += i64::from(asset.initial_quantity);
            }
        }
        summary.in_use = summary.total_asset - summary.available;
        Ok(summary)
    }

    async fn asset_usage(&self, id: AssetId, page: Page) -> Result<AssetUsage> {
        self.check_available()?;
        let tables = self.tables.read().unwrap();
        let asset = tables
            .assets
            .get(&id)
            .cloned()
            .ok_or_else(|| LendingError::asset_not_found(id.get()))?;

        let mut history: Vec<&LoanRequest> = tables
            .requests
            .values()
            .filter(|stored| stored.deleted_at.is_none() && stored.request.asset_id == id)
            .map(|stored| &stored.request)
            .collect();
        history.sort_by(|a, b| b.request_date.cmp(&a.request_date).then(b.id.cmp(&a.id)));
        let total = history.len() as u64;

        let entries = page
            .slice(history)
            .into_iter()
            .map(|request| UsageEntry {
                id: request.id,
                user_id: request.user_id,
                name: tables
                    .users
                    .get(&request.user_id)
                    .map(|user| user.name.clone())
                    .unwrap_or_default(),
                request_date: request.request_date,
                status: request.status.description().to_string(),
            })
            .collect();

        Ok(AssetUsage {
            asset,
            history: entries,
            total_page: page.total_pages(total),
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .unwrap()
            .categories
            .values()
            .cloned()
            .collect())
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        self.check_available()?;
        let mut tables = self.tables.write().unwrap();
        let id = CategoryId::new(tables.next_id());
        let category = Category {
            id,
            name: name.to_string(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.check_available()?;
        let mut tables = self.tables.write().unwrap();
        let id = UserId::new(tables.next_id());
        let created = User {
            id,
            name: user.name,
            email: user.email,
            divisi: user.divisi,
            role: user.role,
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn health_check(&self) -> Result<()> {
        self.check_available()
    }
}
