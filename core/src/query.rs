//! Request query/filter engine.
//!
//! Turns raw query-string values into a typed [`RequestFilter`], scopes it by
//! the caller's role ([`ViewScope`]), and defines the ordering and pagination
//! rules every store follows. The `matches`/`apply` helpers are the in-memory
//! rendition of the same rules the `PostgreSQL` store expresses in SQL.

use crate::error::{LendingError, Result};
use crate::types::{Actor, Asset, CategoryId, RequestDetail, RequestStatus, Role, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Statuses hidden from the manager view: admin-only pending, rejected and return-requested.
pub const MANAGER_HIDDEN: [RequestStatus; 3] = [
    RequestStatus::PendingAdmin,
    RequestStatus::RejectedByAdmin,
    RequestStatus::ReturnRequested,
];

/// Statuses shown in an employee's history.
pub const HISTORY: [RequestStatus; 3] = [
    RequestStatus::Accepted,
    RequestStatus::ReturnRequested,
    RequestStatus::Returned,
];

// ============================================================================
// Status filter
// ============================================================================

/// Named status groups accepted by the `status` query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    /// `new` → pending admin, approved by manager
    New,
    /// `using` → accepted
    Using,
    /// `reject` → rejected by manager or admin
    Reject,
    /// `returned` → return completed
    Returned,
}

impl StatusFilter {
    /// Parse the query value. Empty and `all` mean "no filter".
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] for any other unknown value.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(None),
            "new" => Ok(Some(Self::New)),
            "using" => Ok(Some(Self::Using)),
            "reject" => Ok(Some(Self::Reject)),
            "returned" => Ok(Some(Self::Returned)),
            other => Err(LendingError::Validation(format!(
                "status must be new || using || reject || returned, got {other:?}"
            ))),
        }
    }

    /// Statuses the group expands to.
    #[must_use]
    pub const fn statuses(self) -> &'static [RequestStatus] {
        match self {
            Self::New => &[RequestStatus::PendingAdmin, RequestStatus::ApprovedByManager],
            Self::Using => &[RequestStatus::Accepted],
            Self::Reject => &[RequestStatus::RejectedByManager, RequestStatus::RejectedByAdmin],
            Self::Returned => &[RequestStatus::Returned],
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// `SQL` keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    fn parse(raw: Option<&str>, descending: &str, ascending: &str, param: &str) -> Result<Option<Self>> {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        if raw.eq_ignore_ascii_case(descending) {
            Ok(Some(Self::Descending))
        } else if raw.eq_ignore_ascii_case(ascending) {
            Ok(Some(Self::Ascending))
        } else {
            Err(LendingError::Validation(format!(
                "{param} must be {descending} || {ascending}"
            )))
        }
    }
}

/// Effective row order of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOrder {
    /// Request id ascending (default)
    IdAscending,
    /// By request timestamp
    RequestDate(SortDirection),
    /// By planned return date
    ReturnDate(SortDirection),
    /// Most recently updated first (employee views)
    RecentlyUpdated,
}

impl RequestOrder {
    /// Compare two rows under this order. Ties fall back to request id.
    #[must_use]
    pub fn compare(self, a: &RequestDetail, b: &RequestDetail) -> Ordering {
        let primary = match self {
            Self::IdAscending => Ordering::Equal,
            Self::RequestDate(direction) => direction.apply(a.request_date.cmp(&b.request_date)),
            Self::ReturnDate(direction) => direction.apply(a.return_date.cmp(&b.return_date)),
            Self::RecentlyUpdated => b.updated_at.cmp(&a.updated_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Which of an employee's own requests to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityBucket {
    /// Every own request
    All,
    /// Statuses outside [`HISTORY`]
    Active,
    /// Statuses in [`HISTORY`]
    History,
}

/// Role-dependent restriction applied before any filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewScope {
    /// Every non-deleted request
    Admin,
    /// Requests outside [`MANAGER_HIDDEN`]
    Manager,
    /// Own requests only
    Employee {
        /// Borrower
        user_id: UserId,
        /// Status bucket
        bucket: ActivityBucket,
    },
}

impl ViewScope {
    /// Default listing scope for a caller.
    #[must_use]
    pub const fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => Self::Admin,
            Role::Manager => Self::Manager,
            Role::Employee => Self::Employee {
                user_id: actor.user_id,
                bucket: ActivityBucket::All,
            },
        }
    }

    /// Whether a request with this borrower and status is visible.
    #[must_use]
    pub fn admits(self, user_id: UserId, status: RequestStatus) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => !MANAGER_HIDDEN.contains(&status),
            Self::Employee {
                user_id: owner,
                bucket,
            } => {
                owner == user_id
                    && match bucket {
                        ActivityBucket::All => true,
                        ActivityBucket::Active => !HISTORY.contains(&status),
                        ActivityBucket::History => HISTORY.contains(&status),
                    }
            },
        }
    }

    /// Statuses the scope excludes outright, for `SQL` rendering.
    #[must_use]
    pub const fn excluded_statuses(self) -> &'static [RequestStatus] {
        match self {
            Self::Manager => &MANAGER_HIDDEN,
            Self::Employee {
                bucket: ActivityBucket::Active,
                ..
            } => &HISTORY,
            _ => &[],
        }
    }

    /// Statuses the scope restricts to, for `SQL` rendering. `None` means any.
    #[must_use]
    pub const fn included_statuses(self) -> Option<&'static [RequestStatus]> {
        match self {
            Self::Employee {
                bucket: ActivityBucket::History,
                ..
            } => Some(&HISTORY),
            _ => None,
        }
    }

    /// Borrower the scope is restricted to.
    #[must_use]
    pub const fn owner(self) -> Option<UserId> {
        match self {
            Self::Employee { user_id, .. } => Some(user_id),
            Self::Admin | Self::Manager => None,
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// `limit`/`offset` window. `limit == 0` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum rows, 0 for all
    pub limit: u32,
    /// Rows to skip
    pub offset: u32,
}

impl Page {
    /// Creates a new `Page`
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Parse raw query values. Missing or malformed values fall back to 0.
    #[must_use]
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Self {
        let lenient = |raw: Option<&str>| raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0);
        Self::new(lenient(limit), lenient(offset))
    }

    /// Cut the window out of an ordered row set.
    #[must_use]
    pub fn slice<T>(self, rows: Vec<T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset as usize);
        if self.limit == 0 {
            rows.collect()
        } else {
            rows.take(self.limit as usize).collect()
        }
    }

    /// Page count for `total` matching rows.
    #[must_use]
    pub const fn total_pages(self, total: u64) -> u64 {
        total_pages(total, self.limit)
    }
}

/// `ceil(total / limit)`, or 0 when `limit` is 0.
#[must_use]
pub const fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(limit as u64)
    }
}

/// One page of rows plus the page count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Number of pages at the requested limit
    pub total_page: u64,
    /// Rows in this page
    pub data: Vec<T>,
}

impl<T> Paged<T> {
    /// Build a page from its rows and the total matching count.
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            total_page: page.total_pages(total),
            data,
        }
    }
}

// ============================================================================
// Request filter
// ============================================================================

/// Raw query-string parameters of a request listing.
///
/// Every field is kept as text so a malformed value never fails extraction;
/// [`RequestQuery::into_filter`] decides what is an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RequestQuery {
    /// `new` | `using` | `reject` | `returned`
    pub status: Option<String>,
    /// `latest` | `oldest`
    pub request_date: Option<String>,
    /// `longest` | `shortest`
    pub return_date: Option<String>,
    /// Prefix of the `YYYY-MM-DD` request date
    pub filter_date: Option<String>,
    /// Category name substring
    pub category: Option<String>,
    /// Page size
    pub limit: Option<String>,
    /// Rows to skip
    pub offset: Option<String>,
}

impl RequestQuery {
    /// Validate into a typed filter.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] for an unknown status group or sort keyword.
    pub fn into_filter(self) -> Result<RequestFilter> {
        Ok(RequestFilter {
            status: StatusFilter::parse(self.status.as_deref().unwrap_or_default())?,
            filter_date: non_blank(self.filter_date),
            category: non_blank(self.category),
            request_date: SortDirection::parse(
                self.request_date.as_deref(),
                "latest",
                "oldest",
                "request_date",
            )?,
            return_date: SortDirection::parse(
                self.return_date.as_deref(),
                "longest",
                "shortest",
                "return_date",
            )?,
            page: Page::parse(self.limit.as_deref(), self.offset.as_deref()),
        })
    }
}

/// Typed request listing filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Status group
    pub status: Option<StatusFilter>,
    /// Prefix of the `YYYY-MM-DD` request date
    pub filter_date: Option<String>,
    /// Case-insensitive category name substring
    pub category: Option<String>,
    /// Order by request timestamp
    pub request_date: Option<SortDirection>,
    /// Order by planned return date
    pub return_date: Option<SortDirection>,
    /// Window
    pub page: Page,
}

impl RequestFilter {
    /// Unfiltered listing over one window.
    #[must_use]
    pub fn page(page: Page) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Row order under `scope`. An explicit sort wins over the scope default.
    #[must_use]
    pub const fn order(&self, scope: ViewScope) -> RequestOrder {
        if let Some(direction) = self.request_date {
            return RequestOrder::RequestDate(direction);
        }
        if let Some(direction) = self.return_date {
            return RequestOrder::ReturnDate(direction);
        }
        match scope {
            ViewScope::Employee { .. } => RequestOrder::RecentlyUpdated,
            ViewScope::Admin | ViewScope::Manager => RequestOrder::IdAscending,
        }
    }

    /// Whether a row passes scope and filters.
    #[must_use]
    pub fn matches(&self, scope: ViewScope, row: &RequestDetail) -> bool {
        if !scope.admits(row.user_id, row.status) {
            return false;
        }
        if let Some(group) = self.status {
            if !group.statuses().contains(&row.status) {
                return false;
            }
        }
        if let Some(prefix) = &self.filter_date {
            if !row.request_date.format("%Y-%m-%d").to_string().starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.category {
            if !row.category.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Filter, order and paginate rows in memory.
    #[must_use]
    pub fn apply(&self, scope: ViewScope, rows: Vec<RequestDetail>) -> Paged<RequestDetail> {
        let mut rows: Vec<RequestDetail> =
            rows.into_iter().filter(|row| self.matches(scope, row)).collect();
        let order = self.order(scope);
        rows.sort_by(|a, b| order.compare(a, b));
        let total = rows.len() as u64;
        Paged::new(self.page.slice(rows), total, self.page)
    }
}

// ============================================================================
// Asset filter
// ============================================================================

/// Raw query-string parameters of an asset listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AssetQuery {
    /// Category id, or `all`
    pub category: Option<String>,
    /// `true` | `false`
    pub maintenance: Option<String>,
    /// `true` → only assets with units on the shelf
    pub avail: Option<String>,
    /// Page size
    pub limit: Option<String>,
    /// Rows to skip
    pub offset: Option<String>,
}

impl AssetQuery {
    /// Validate into a typed filter.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] for a non-numeric category or a
    /// non-boolean flag.
    pub fn into_filter(self) -> Result<AssetFilter> {
        let category = match non_blank(self.category) {
            None => None,
            Some(raw) if raw.eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(CategoryId::new(raw.parse().map_err(|_| {
                LendingError::Validation(format!("category must be a number, got {raw:?}"))
            })?)),
        };
        Ok(AssetFilter {
            category,
            maintenance: parse_flag(self.maintenance, "maintenance")?,
            available_only: parse_flag(self.avail, "avail")?.unwrap_or(false),
            page: Page::parse(self.limit.as_deref(), self.offset.as_deref()),
        })
    }
}

/// Typed asset listing filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Restrict to a category
    pub category: Option<CategoryId>,
    /// Restrict by maintenance flag
    pub maintenance: Option<bool>,
    /// Only assets with `available_quantity > 0`
    pub available_only: bool,
    /// Window
    pub page: Page,
}

impl AssetFilter {
    /// Whether an asset passes the filter.
    #[must_use]
    pub fn matches(&self, asset: &Asset) -> bool {
        self.category.is_none_or(|category| asset.category_id == category)
            && self.maintenance.is_none_or(|flag| asset.is_maintenance == flag)
            && (!self.available_only || asset.available_quantity > 0)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: Option<String>, param: &str) -> Result<Option<bool>> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(LendingError::Validation(format!("{param} must be true || false"))),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::{AssetId, RequestId, ReturnDate};
    use chrono::{TimeZone, Utc};

    fn row(id: i64, user: i64, status: RequestStatus, day: u32, category: &str) -> RequestDetail {
        let at = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        RequestDetail {
            id: RequestId::new(id),
            user_id: UserId::new(user),
            asset_id: AssetId::new(1),
            status,
            request_date: at,
            return_date: ReturnDate::sentinel(),
            description: String::new(),
            user_name: "Budi".to_string(),
            asset_name: "Projector".to_string(),
            category: category.to_string(),
            available_quantity: 1,
            status_description: status.description().to_string(),
            updated_at: at,
        }
    }

    #[test]
    fn total_pages_uses_ceiling() {
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(11, 5), 3);
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(total_pages(4, 5), 1);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn status_groups() {
        assert_eq!(StatusFilter::parse("new").unwrap(), Some(StatusFilter::New));
        assert_eq!(StatusFilter::parse("").unwrap(), None);
        assert_eq!(StatusFilter::parse("ALL").unwrap(), None);
        assert!(StatusFilter::parse("pending").is_err());

        let codes = |f: StatusFilter| f.statuses().iter().map(|s| s.code()).collect::<Vec<_>>();
        assert_eq!(codes(StatusFilter::New), vec![1, 3]);
        assert_eq!(codes(StatusFilter::Using), vec![6]);
        assert_eq!(codes(StatusFilter::Reject), vec![4, 5]);
        assert_eq!(codes(StatusFilter::Returned), vec![8]);
    }

    #[test]
    fn manager_scope_hides_admin_states() {
        let visible: Vec<i64> = RequestStatus::ALL
            .into_iter()
            .filter(|s| ViewScope::Manager.admits(UserId::new(1), *s))
            .map(RequestStatus::code)
            .collect();
        assert_eq!(visible, vec![2, 3, 4, 6, 8]);
    }

    #[test]
    fn employee_buckets_split_history() {
        let user = UserId::new(4);
        let scope = |bucket| ViewScope::Employee { user_id: user, bucket };
        assert!(scope(ActivityBucket::History).admits(user, RequestStatus::Returned));
        assert!(!scope(ActivityBucket::History).admits(user, RequestStatus::PendingAdmin));
        assert!(scope(ActivityBucket::Active).admits(user, RequestStatus::PendingAdmin));
        assert!(!scope(ActivityBucket::Active).admits(user, RequestStatus::Accepted));
        assert!(!scope(ActivityBucket::All).admits(UserId::new(5), RequestStatus::PendingAdmin));
    }

    #[test]
    fn malformed_paging_falls_back_to_zero() {
        assert_eq!(Page::parse(Some("abc"), Some("-3")), Page::new(0, 0));
        assert_eq!(Page::parse(Some("5"), None), Page::new(5, 0));
    }

    #[test]
    fn query_string_maps_to_filter() {
        let filter = RequestQuery {
            status: Some("reject".to_string()),
            request_date: Some("latest".to_string()),
            filter_date: Some(" 2025-03 ".to_string()),
            limit: Some("2".to_string()),
            ..RequestQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.status, Some(StatusFilter::Reject));
        assert_eq!(filter.request_date, Some(SortDirection::Descending));
        assert_eq!(filter.filter_date.as_deref(), Some("2025-03"));
        assert_eq!(filter.page, Page::new(2, 0));

        let bad = RequestQuery {
            return_date: Some("soon".to_string()),
            ..RequestQuery::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn apply_filters_orders_and_pages() {
        let rows = vec![
            row(1, 1, RequestStatus::PendingAdmin, 1, "Electronics"),
            row(2, 1, RequestStatus::ApprovedByManager, 2, "Electronics"),
            row(3, 2, RequestStatus::ApprovedByManager, 3, "Furniture"),
            row(4, 2, RequestStatus::Accepted, 4, "Electronics"),
        ];
        let filter = RequestFilter {
            status: Some(StatusFilter::New),
            category: Some("electro".to_string()),
            request_date: Some(SortDirection::Descending),
            page: Page::new(1, 0),
            ..RequestFilter::default()
        };
        let page = filter.apply(ViewScope::Admin, rows.clone());
        assert_eq!(page.total_page, 2);
        assert_eq!(page.data.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![2]);

        let by_day = RequestFilter {
            filter_date: Some("2025-03-03".to_string()),
            ..RequestFilter::default()
        };
        let page = by_day.apply(ViewScope::Admin, rows);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total_page, 0);
    }

    #[test]
    fn asset_query_flags() {
        let filter = AssetQuery {
            category: Some("all".to_string()),
            maintenance: Some("false".to_string()),
            avail: Some("true".to_string()),
            ..AssetQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.maintenance, Some(false));
        assert!(filter.available_only);

        let bad = AssetQuery {
            category: Some("tools".to_string()),
            ..AssetQuery::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
