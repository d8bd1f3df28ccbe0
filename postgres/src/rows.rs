//! Row shapes read back from `PostgreSQL` and their conversion into domain types.

use asset_lending_core::error::{LendingError, Result};
use asset_lending_core::types::{
    Asset, AssetId, Category, CategoryId, LoanRequest, RequestDetail, RequestId, RequestStatus,
    ReturnDate, Role, User, UsageEntry, UserId,
};
use chrono::{DateTime, Utc};

/// Columns selected for a bare request.
pub(crate) const REQUEST_COLUMNS: &str = "r.id, r.id_user, r.id_asset, r.id_status, \
     r.request_date, r.return_date, r.description, r.updated_at";

/// Columns selected for a request joined with its labels.
pub(crate) const DETAIL_COLUMNS: &str = "r.id, r.id_user, r.id_asset, r.id_status, \
     r.request_date, r.return_date, r.description, r.updated_at, \
     COALESCE(u.name, '') AS user_name, a.name AS asset_name, \
     c.description AS category, a.available_quantity";

/// Joins behind [`DETAIL_COLUMNS`].
pub(crate) const DETAIL_JOINS: &str = "FROM requests r \
     JOIN assets a ON a.id = r.id_asset \
     JOIN categories c ON c.id = a.id_category \
     LEFT JOIN users u ON u.id = r.id_user";

/// Columns selected for an asset with its category name.
pub(crate) const ASSET_COLUMNS: &str = "a.id, a.id_category, a.is_maintenance, a.name, \
     a.description, a.initial_quantity, a.available_quantity, a.photo, \
     c.description AS category";

/// Status codes are 1..=8 and stored as `SMALLINT`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn status_code(status: RequestStatus) -> i16 {
    status.code() as i16
}

/// Role codes are 1..=3 and stored as `SMALLINT`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn role_code(role: Role) -> i16 {
    role.code() as i16
}

fn status(raw: i16) -> Result<RequestStatus> {
    RequestStatus::try_from(i64::from(raw))
        .map_err(|_| LendingError::Persistence(format!("stored status {raw} is not a known status")))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RequestRow {
    id: i64,
    id_user: i64,
    id_asset: i64,
    id_status: i16,
    request_date: DateTime<Utc>,
    return_date: String,
    description: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for LoanRequest {
    type Error = LendingError;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(Self {
            id: RequestId::new(row.id),
            user_id: UserId::new(row.id_user),
            asset_id: AssetId::new(row.id_asset),
            status: status(row.id_status)?,
            request_date: row.request_date,
            return_date: ReturnDate::from_stored(row.return_date),
            description: row.description,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DetailRow {
    id: i64,
    id_user: i64,
    id_asset: i64,
    id_status: i16,
    request_date: DateTime<Utc>,
    return_date: String,
    description: String,
    updated_at: DateTime<Utc>,
    user_name: String,
    asset_name: String,
    category: String,
    available_quantity: i32,
}

impl TryFrom<DetailRow> for RequestDetail {
    type Error = LendingError;

    fn try_from(row: DetailRow) -> Result<Self> {
        let status = status(row.id_status)?;
        Ok(Self {
            id: RequestId::new(row.id),
            user_id: UserId::new(row.id_user),
            asset_id: AssetId::new(row.id_asset),
            status,
            request_date: row.request_date,
            return_date: ReturnDate::from_stored(row.return_date),
            description: row.description,
            user_name: row.user_name,
            asset_name: row.asset_name,
            category: row.category,
            available_quantity: row.available_quantity,
            status_description: status.description().to_string(),
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AssetRow {
    id: i64,
    id_category: i64,
    is_maintenance: bool,
    name: String,
    description: String,
    initial_quantity: i32,
    available_quantity: i32,
    photo: String,
    category: String,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Self {
            id: AssetId::new(row.id),
            category_id: CategoryId::new(row.id_category),
            is_maintenance: row.is_maintenance,
            name: row.name,
            description: row.description,
            initial_quantity: row.initial_quantity,
            available_quantity: row.available_quantity,
            photo: row.photo,
            category: row.category,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CategoryRow {
    id: i64,
    description: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.description,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    name: String,
    email: String,
    divisi: String,
    id_role: i16,
}

impl TryFrom<UserRow> for User {
    type Error = LendingError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::try_from(i64::from(row.id_role)).map_err(|_| {
            LendingError::Persistence(format!("stored role {} is not a known role", row.id_role))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            divisi: row.divisi,
            role,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UsageRow {
    id: i64,
    id_user: i64,
    name: String,
    request_date: DateTime<Utc>,
    id_status: i16,
}

impl TryFrom<UsageRow> for UsageEntry {
    type Error = LendingError;

    fn try_from(row: UsageRow) -> Result<Self> {
        Ok(Self {
            id: RequestId::new(row.id),
            user_id: UserId::new(row.id_user),
            name: row.name,
            request_date: row.request_date,
            status: status(row.id_status)?.description().to_string(),
        })
    }
}
