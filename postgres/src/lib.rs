//! `PostgreSQL` storage for the asset lending tracker.
//!
//! [`PostgresLendingStore`] implements [`LendingStore`] over a sqlx pool:
//!
//! - Every effect of one reduction runs inside a single transaction
//! - Ledger decrements are one conditional `UPDATE`, so concurrent
//!   acceptances can never take the shelf count below zero
//! - Asset capacity changes lock the asset row (`SELECT ... FOR UPDATE`)
//! - Listings are rendered with `QueryBuilder`, with a matching `COUNT(*)`
//!
//! # Example
//!
//! ```ignore
//! use asset_lending_postgres::PostgresLendingStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/lending").await?;
//!     let store = PostgresLendingStore::new(pool);
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod listing;
mod rows;

use asset_lending_core::effect::{Effect, Effects, RequestWrite};
use asset_lending_core::error::{LendingError, Result};
use asset_lending_core::ledger::{LedgerEffect, LedgerOutcome, Quantities};
use asset_lending_core::query::{AssetFilter, Page, Paged, RequestFilter, ViewScope};
use asset_lending_core::store::{CommitOutcome, LendingStore};
use asset_lending_core::types::{
    Asset, AssetId, AssetPatch, AssetSummary, AssetUsage, Category, LoanRequest, NewAsset,
    NewRequest, NewUser, RequestDetail, RequestId, User, UsageEntry,
};
use async_trait::async_trait;
use rows::{
    ASSET_COLUMNS, AssetRow, CategoryRow, DETAIL_COLUMNS, DETAIL_JOINS, DetailRow,
    REQUEST_COLUMNS, RequestRow, UsageRow, UserRow, role_code, status_code,
};
use sqlx::{PgConnection, PgPool};

fn persistence(error: sqlx::Error) -> LendingError {
    LendingError::Persistence(error.to_string())
}

fn ledger_failure(error: sqlx::Error) -> LendingError {
    LendingError::LedgerUpdate(error.to_string())
}

fn row_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// `PostgreSQL`-backed [`LendingStore`].
#[derive(Clone, Debug)]
pub struct PostgresLendingStore {
    pool: PgPool,
}

impl PostgresLendingStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LendingError::Persistence(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Mark a request as deleted. Deleted requests are invisible to every read.
    ///
    /// Returns `false` when no live request has that id.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Persistence`] if the update fails.
    pub async fn soft_delete_request(&self, id: RequestId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE requests SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(result.rows_affected() == 1)
    }

    async fn asset_exists(conn: &mut PgConnection, id: AssetId) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM assets WHERE id = $1)")
            .bind(id.get())
            .fetch_one(conn)
            .await
            .map_err(persistence)?;
        Ok(exists)
    }

    async fn insert_request(conn: &mut PgConnection, new: NewRequest) -> Result<RequestId> {
        if !Self::asset_exists(&mut *conn, new.asset_id).await? {
            return Err(LendingError::asset_not_found(new.asset_id.get()));
        }
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO requests (
                id_user, id_asset, id_status, request_date, return_date, description, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $4)
            RETURNING id
            ",
        )
        .bind(new.user_id.get())
        .bind(new.asset_id.get())
        .bind(status_code(new.status))
        .bind(new.requested_at)
        .bind(new.return_date.as_str())
        .bind(&new.description)
        .fetch_one(conn)
        .await
        .map_err(persistence)?;

        tracing::debug!(request_id = id, asset_id = %new.asset_id, "Request inserted");
        Ok(RequestId::new(id))
    }

    async fn write_request(conn: &mut PgConnection, write: RequestWrite) -> Result<()> {
        if let Some(asset_id) = write.asset_id {
            if !Self::asset_exists(&mut *conn, asset_id).await? {
                return Err(LendingError::asset_not_found(asset_id.get()));
            }
        }
        let result = sqlx::query(
            r"
            UPDATE requests
            SET id_status = $2,
                id_asset = COALESCE($3, id_asset),
                return_date = COALESCE($4, return_date),
                description = COALESCE($5, description),
                updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(write.id.get())
        .bind(status_code(write.status))
        .bind(write.asset_id.map(AssetId::get))
        .bind(write.return_date.as_ref().map(|date| date.as_str().to_string()))
        .bind(write.description)
        .bind(write.updated_at)
        .execute(conn)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(LendingError::request_not_found(write.id.get()));
        }
        Ok(())
    }

    /// Resolve the asset through the request row, then adjust it with a
    /// single conditional `UPDATE`.
    async fn apply_ledger(conn: &mut PgConnection, effect: LedgerEffect) -> Result<LedgerOutcome> {
        let request_id = effect.request_id();
        let asset: Option<(i64,)> =
            sqlx::query_as("SELECT id_asset FROM requests WHERE id = $1 AND deleted_at IS NULL")
                .bind(request_id.get())
                .fetch_optional(&mut *conn)
                .await
                .map_err(ledger_failure)?;
        let asset_id = asset
            .map(|(id,)| AssetId::new(id))
            .ok_or_else(|| LendingError::request_not_found(request_id.get()))?;

        let sql = match effect {
            LedgerEffect::Decrement { .. } => {
                r"
                UPDATE assets
                SET available_quantity = available_quantity - 1, updated_at = now()
                WHERE id = $1 AND available_quantity > 0
                RETURNING available_quantity
                "
            },
            LedgerEffect::Increment { .. } => {
                r"
                UPDATE assets
                SET available_quantity = available_quantity + 1, updated_at = now()
                WHERE id = $1 AND available_quantity < initial_quantity
                RETURNING available_quantity
                "
            },
        };
        let updated: Option<(i32,)> = sqlx::query_as(sql)
            .bind(asset_id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(ledger_failure)?;

        let Some((available,)) = updated else {
            if !Self::asset_exists(&mut *conn, asset_id).await? {
                return Err(LendingError::asset_not_found(asset_id.get()));
            }
            return match effect {
                LedgerEffect::Decrement { .. } => Err(LendingError::OutOfStock { asset_id }),
                LedgerEffect::Increment { .. } => Ok(LedgerOutcome::AtCapacity { asset_id }),
            };
        };

        Ok(match effect {
            LedgerEffect::Decrement { .. } => LedgerOutcome::Decremented { asset_id, available },
            LedgerEffect::Increment { .. } => LedgerOutcome::Incremented { asset_id, available },
        })
    }

    async fn load_asset(conn: &mut PgConnection, id: AssetId) -> Result<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets a JOIN categories c ON c.id = a.id_category \
             WHERE a.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(conn)
        .await
        .map_err(persistence)?;
        Ok(row.map(Asset::from))
    }
}

#[async_trait]
impl LendingStore for PostgresLendingStore {
    async fn find_request(&self, id: RequestId) -> Result<Option<LoanRequest>> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests r WHERE r.id = $1 AND r.deleted_at IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        row.map(LoanRequest::try_from).transpose()
    }

    async fn request_detail(&self, id: RequestId) -> Result<Option<RequestDetail>> {
        let row: Option<DetailRow> = sqlx::query_as(&format!(
            "SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE r.id = $1 AND r.deleted_at IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        row.map(RequestDetail::try_from).transpose()
    }

    async fn commit(&self, effects: Effects) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;
        let mut outcome = CommitOutcome::default();

        for effect in effects {
            let applied = match effect {
                Effect::InsertRequest(new) => Self::insert_request(&mut tx, new)
                    .await
                    .map(|id| outcome.inserted = Some(id)),
                Effect::WriteRequest(write) => Self::write_request(&mut tx, write).await,
                Effect::Ledger(ledger) => Self::apply_ledger(&mut tx, ledger)
                    .await
                    .map(|result| outcome.ledger = Some(result)),
            };
            if let Err(error) = applied {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(%rollback, "Rollback failed");
                }
                return Err(error);
            }
        }

        tx.commit().await.map_err(persistence)?;
        Ok(outcome)
    }

    async fn list_requests(
        &self,
        scope: ViewScope,
        filter: &RequestFilter,
    ) -> Result<Paged<RequestDetail>> {
        let (total,): (i64,) = listing::request_count(scope, filter)
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(persistence)?;
        let rows: Vec<DetailRow> = listing::request_page(scope, filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        let data = rows
            .into_iter()
            .map(RequestDetail::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Paged::new(data, row_count(total), filter.page))
    }

    async fn create_asset(&self, asset: NewAsset) -> Result<Asset> {
        let quantities = Quantities::full(asset.initial_quantity)?;
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let category: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(asset.category_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(persistence)?;
        if category.is_none() {
            return Err(LendingError::NotFound {
                resource: "category",
                id: asset.category_id.get(),
            });
        }

        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO assets (
                id_category, is_maintenance, name, description,
                initial_quantity, available_quantity, photo
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(asset.category_id.get())
        .bind(asset.is_maintenance)
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(quantities.initial())
        .bind(quantities.available())
        .bind(&asset.photo)
        .fetch_one(&mut *tx)
        .await
        .map_err(persistence)?;

        let created = Self::load_asset(&mut tx, AssetId::new(id))
            .await?
            .ok_or_else(|| LendingError::asset_not_found(id))?;
        tx.commit().await.map_err(persistence)?;
        Ok(created)
    }

    async fn find_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        let mut conn = self.pool.acquire().await.map_err(persistence)?;
        Self::load_asset(&mut conn, id).await
    }

    async fn list_assets(&self, filter: &AssetFilter) -> Result<Paged<Asset>> {
        let (total,): (i64,) = listing::asset_count(filter)
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(persistence)?;
        let rows: Vec<AssetRow> = listing::asset_page(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(Paged::new(
            rows.into_iter().map(Asset::from).collect(),
            row_count(total),
            filter.page,
        ))
    }

    async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> Result<Asset> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let locked: Option<(i32, i32)> = sqlx::query_as(
            "SELECT initial_quantity, available_quantity FROM assets WHERE id = $1 FOR UPDATE",
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(persistence)?;
        let (initial, available) = locked.ok_or_else(|| LendingError::asset_not_found(id.get()))?;

        let quantities = match patch.initial_quantity {
            Some(new_initial) => Quantities::new(initial, available)?.adjust_initial(id, new_initial)?,
            None => Quantities::new(initial, available)?,
        };

        if let Some(category_id) = patch.category_id {
            let category: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM categories WHERE id = $1")
                    .bind(category_id.get())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(persistence)?;
            if category.is_none() {
                return Err(LendingError::NotFound {
                    resource: "category",
                    id: category_id.get(),
                });
            }
        }

        sqlx::query(
            r"
            UPDATE assets
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                id_category = COALESCE($4, id_category),
                is_maintenance = COALESCE($5, is_maintenance),
                photo = COALESCE($6, photo),
                initial_quantity = $7,
                available_quantity = $8,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.category_id.map(|category| category.get()))
        .bind(patch.is_maintenance)
        .bind(patch.photo)
        .bind(quantities.initial())
        .bind(quantities.available())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        let updated = Self::load_asset(&mut tx, id)
            .await?
            .ok_or_else(|| LendingError::asset_not_found(id.get()))?;
        tx.commit().await.map_err(persistence)?;
        Ok(updated)
    }

    async fn asset_summary(&self) -> Result<AssetSummary> {
        let (total_asset, available, maintenance): (i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                COALESCE(SUM(initial_quantity), 0)::BIGINT,
                COALESCE(SUM(available_quantity), 0)::BIGINT,
                COALESCE(SUM(initial_quantity) FILTER (WHERE is_maintenance), 0)::BIGINT
            FROM assets
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(AssetSummary {
            total_asset,
            in_use: total_asset - available,
            maintenance,
            available,
        })
    }

    async fn asset_usage(&self, id: AssetId, page: Page) -> Result<AssetUsage> {
        let asset = self
            .find_asset(id)
            .await?
            .ok_or_else(|| LendingError::asset_not_found(id.get()))?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM requests WHERE id_asset = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        // LIMIT NULL is no limit
        let limit = (page.limit > 0).then(|| i64::from(page.limit));
        let rows: Vec<UsageRow> = sqlx::query_as(
            r"
            SELECT r.id, r.id_user, COALESCE(u.name, '') AS name, r.request_date, r.id_status
            FROM requests r
            LEFT JOIN users u ON u.id = r.id_user
            WHERE r.id_asset = $1 AND r.deleted_at IS NULL
            ORDER BY r.request_date DESC, r.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(id.get())
        .bind(limit)
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        let history = rows
            .into_iter()
            .map(UsageEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(AssetUsage {
            asset,
            history,
            total_page: page.total_pages(row_count(total)),
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, description FROM categories ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(persistence)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO categories (description) VALUES ($1) RETURNING id, description",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.into())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (name, email, divisi, id_role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, divisi, id_role
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.divisi)
        .bind(role_code(user.role))
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;
        row.try_into()
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}
