//! `SQL` rendering of request and asset listings.
//!
//! The same conditions feed the page query and its `COUNT(*)`, so
//! `total_page` always describes the rows the filter admits.

use crate::rows::{ASSET_COLUMNS, DETAIL_COLUMNS, DETAIL_JOINS, status_code};
use asset_lending_core::query::{AssetFilter, Page, RequestFilter, RequestOrder, ViewScope};
use asset_lending_core::types::RequestStatus;
use sqlx::{Postgres, QueryBuilder};

/// `SELECT` for one page of requests.
pub(crate) fn request_page(scope: ViewScope, filter: &RequestFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {DETAIL_COLUMNS} {DETAIL_JOINS}"));
    push_request_conditions(&mut builder, scope, filter);
    builder.push(" ORDER BY ");
    builder.push(order_by(filter.order(scope)));
    push_page(&mut builder, filter.page);
    builder
}

/// `COUNT(*)` over the same conditions as [`request_page`].
pub(crate) fn request_count(scope: ViewScope, filter: &RequestFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) {DETAIL_JOINS}"));
    push_request_conditions(&mut builder, scope, filter);
    builder
}

/// `SELECT` for one page of assets, ordered by id.
pub(crate) fn asset_page(filter: &AssetFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {ASSET_COLUMNS} FROM assets a JOIN categories c ON c.id = a.id_category"
    ));
    push_asset_conditions(&mut builder, filter);
    builder.push(" ORDER BY a.id ASC");
    push_page(&mut builder, filter.page);
    builder
}

/// `COUNT(*)` over the same conditions as [`asset_page`].
pub(crate) fn asset_count(filter: &AssetFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM assets a");
    push_asset_conditions(&mut builder, filter);
    builder
}

fn push_request_conditions(
    builder: &mut QueryBuilder<'static, Postgres>,
    scope: ViewScope,
    filter: &RequestFilter,
) {
    builder.push(" WHERE r.deleted_at IS NULL");

    if let Some(owner) = scope.owner() {
        builder.push(" AND r.id_user = ").push_bind(owner.get());
    }
    let excluded = scope.excluded_statuses();
    if !excluded.is_empty() {
        builder.push(" AND r.id_status NOT IN ");
        push_status_list(builder, excluded);
    }
    if let Some(included) = scope.included_statuses() {
        builder.push(" AND r.id_status IN ");
        push_status_list(builder, included);
    }

    if let Some(group) = filter.status {
        builder.push(" AND r.id_status IN ");
        push_status_list(builder, group.statuses());
    }
    if let Some(prefix) = &filter.filter_date {
        builder
            .push(" AND to_char(r.request_date AT TIME ZONE 'UTC', 'YYYY-MM-DD') LIKE ")
            .push_bind(format!("{}%", escape_like(prefix)));
    }
    if let Some(needle) = &filter.category {
        builder
            .push(" AND c.description ILIKE ")
            .push_bind(format!("%{}%", escape_like(needle)));
    }
}

fn push_asset_conditions(builder: &mut QueryBuilder<'static, Postgres>, filter: &AssetFilter) {
    builder.push(" WHERE TRUE");
    if let Some(category) = filter.category {
        builder.push(" AND a.id_category = ").push_bind(category.get());
    }
    if let Some(flag) = filter.maintenance {
        builder.push(" AND a.is_maintenance = ").push_bind(flag);
    }
    if filter.available_only {
        builder.push(" AND a.available_quantity > 0");
    }
}

fn push_status_list(builder: &mut QueryBuilder<'static, Postgres>, statuses: &[RequestStatus]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for status in statuses {
        separated.push_bind(status_code(*status));
    }
    separated.push_unseparated(")");
}

fn push_page(builder: &mut QueryBuilder<'static, Postgres>, page: Page) {
    if page.limit > 0 {
        builder.push(" LIMIT ").push_bind(i64::from(page.limit));
    }
    builder.push(" OFFSET ").push_bind(i64::from(page.offset));
}

/// Ties always fall back to the request id so pages are stable.
fn order_by(order: RequestOrder) -> String {
    match order {
        RequestOrder::IdAscending => "r.id ASC".to_string(),
        RequestOrder::RequestDate(direction) => {
            format!("r.request_date {}, r.id ASC", direction.as_sql())
        },
        RequestOrder::ReturnDate(direction) => {
            format!("r.return_date COLLATE \"C\" {}, r.id ASC", direction.as_sql())
        },
        RequestOrder::RecentlyUpdated => "r.updated_at DESC, r.id ASC".to_string(),
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_lending_core::query::{ActivityBucket, SortDirection, StatusFilter};
    use asset_lending_core::types::{CategoryId, UserId};

    #[test]
    fn manager_listing_excludes_hidden_statuses() {
        let sql = request_page(ViewScope::Manager, &RequestFilter::default()).into_sql();
        assert!(sql.contains("r.id_status NOT IN ($1, $2, $3)"), "{sql}");
        assert!(sql.ends_with("ORDER BY r.id ASC OFFSET $4"), "{sql}");
    }

    #[test]
    fn employee_history_is_owned_and_recent_first() {
        let scope = ViewScope::Employee {
            user_id: UserId::new(7),
            bucket: ActivityBucket::History,
        };
        let filter = RequestFilter::page(Page::new(10, 20));
        let sql = request_page(scope, &filter).into_sql();
        assert!(sql.contains("r.id_user = $1"), "{sql}");
        assert!(sql.contains("r.id_status IN ($2, $3, $4)"), "{sql}");
        assert!(sql.contains("ORDER BY r.updated_at DESC, r.id ASC LIMIT $5 OFFSET $6"), "{sql}");
    }

    #[test]
    fn explicit_sort_and_filters_render() {
        let filter = RequestFilter {
            status: Some(StatusFilter::Reject),
            filter_date: Some("2025-03".to_string()),
            category: Some("elec".to_string()),
            return_date: Some(SortDirection::Descending),
            ..RequestFilter::default()
        };
        let sql = request_page(ViewScope::Admin, &filter).into_sql();
        assert!(sql.contains("r.id_status IN ($1, $2)"), "{sql}");
        assert!(sql.contains("LIKE $3"), "{sql}");
        assert!(sql.contains("ILIKE $4"), "{sql}");
        assert!(sql.contains("ORDER BY r.return_date COLLATE \"C\" DESC, r.id ASC"), "{sql}");

        let count = request_count(ViewScope::Admin, &filter).into_sql();
        assert!(count.starts_with("SELECT COUNT(*)"), "{count}");
        assert!(!count.contains("ORDER BY"), "{count}");
    }

    #[test]
    fn asset_filters_render() {
        let filter = AssetFilter {
            category: Some(CategoryId::new(2)),
            maintenance: Some(false),
            available_only: true,
            page: Page::new(5, 0),
        };
        let sql = asset_page(&filter).into_sql();
        assert!(sql.contains("a.id_category = $1"), "{sql}");
        assert!(sql.contains("a.is_maintenance = $2"), "{sql}");
        assert!(sql.contains("a.available_quantity > 0"), "{sql}");
        assert!(sql.ends_with("ORDER BY a.id ASC LIMIT $3 OFFSET $4"), "{sql}");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
