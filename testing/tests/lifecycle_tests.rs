//! End-to-end lifecycle tests against the in-memory store.
//!
//! Exercises the service shell: role-gated transitions, ledger coupling,
//! transactional rollback and the concurrent-accept bound.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use asset_lending_core::error::LendingError;
use asset_lending_core::ledger::LedgerOutcome;
use asset_lending_core::lifecycle::RequestPatch;
use asset_lending_core::query::{ActivityBucket, Page, RequestQuery};
use asset_lending_core::service::LendingService;
use asset_lending_core::types::{AssetId, AssetPatch, RequestId, RequestStatus};
use asset_lending_testing::fixtures::{self, Seed};
use asset_lending_testing::{InMemoryLendingStore, test_clock};
use std::sync::Arc;

async fn setup() -> (Arc<InMemoryLendingStore>, LendingService, Seed) {
    asset_lending_testing::helpers::init_tracing();
    let store = Arc::new(InMemoryLendingStore::new());
    let seed = fixtures::seed(store.as_ref()).await.unwrap();
    let service = LendingService::new(store.clone(), Arc::new(test_clock()));
    (store, service, seed)
}

async fn pending_request(service: &LendingService, seed: &Seed) -> RequestId {
    service
        .create_request(&seed.employee, seed.request_for_asset())
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn full_borrow_and_return_cycle() {
    let (store, service, seed) = setup().await;
    let asset = seed.asset.id;

    // Employee files: status 1
    let created = service
        .create_request(&seed.employee, seed.request_for_asset())
        .await
        .unwrap();
    assert_eq!(created.status, RequestStatus::PendingAdmin);
    assert_eq!(created.user_name, "Budi");
    assert_eq!(created.available_quantity, 2);
    let id = created.id;

    // Admin forwards: status 2
    let step = service
        .submit_status_change(&seed.admin, id, 2, RequestPatch::default())
        .await
        .unwrap();
    assert_eq!(step.request.status, RequestStatus::PendingManager);
    assert_eq!(step.ledger, None);

    // Manager approves: status 3
    service
        .submit_status_change(&seed.manager, id, 3, RequestPatch::default())
        .await
        .unwrap();

    // Admin accepts: status 6, one unit leaves
    let accepted = service
        .submit_status_change(&seed.admin, id, 6, RequestPatch::default())
        .await
        .unwrap();
    assert_eq!(
        accepted.ledger,
        Some(LedgerOutcome::Decremented {
            asset_id: asset,
            available: 1
        })
    );
    assert!(accepted.request.return_date.is_sentinel());
    assert_eq!(store.available_quantity(asset), Some(1));

    // Employee confirms return: status 8, unit comes back
    let returned = service
        .submit_status_change(&seed.employee, id, 8, RequestPatch::default())
        .await
        .unwrap();
    assert_eq!(returned.request.status, RequestStatus::Returned);
    assert_eq!(store.available_quantity(asset), Some(2));
}

#[tokio::test]
async fn manager_cannot_reset_to_pending_admin() {
    let (_store, service, seed) = setup().await;
    let id = pending_request(&service, &seed).await;

    let err = service
        .submit_status_change(&seed.manager, id, 1, RequestPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "id_status must be 3 || 4");
    assert!(err.is_authorization());
}

#[tokio::test]
async fn repeated_returns_never_exceed_capacity() {
    let (store, service, seed) = setup().await;
    let id = pending_request(&service, &seed).await;

    for _ in 0..3 {
        let outcome = service
            .submit_status_change(&seed.employee, id, 8, RequestPatch::default())
            .await
            .unwrap();
        assert_eq!(
            outcome.ledger,
            Some(LedgerOutcome::AtCapacity {
                asset_id: seed.asset.id
            })
        );
    }
    assert_eq!(store.available_quantity(seed.asset.id), Some(2));
}

#[tokio::test]
async fn accept_at_zero_is_out_of_stock_and_leaves_status() {
    let (store, service, seed) = setup().await;
    let asset = fixtures::asset(store.as_ref(), &seed.category, "Camera", 0)
        .await
        .unwrap();
    let mut input = seed.request_for_asset();
    input.asset_id = asset.id;
    let id = service
        .create_request(&seed.employee, input)
        .await
        .unwrap()
        .id;

    let err = service
        .submit_status_change(&seed.admin, id, 6, RequestPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::OutOfStock { asset_id: asset.id });

    let detail = service.request_detail(&seed.admin, id).await.unwrap();
    assert_eq!(detail.status, RequestStatus::PendingAdmin);
    assert_eq!(store.available_quantity(asset.id), Some(0));
}

#[tokio::test]
async fn failed_ledger_write_rolls_back_status() {
    let (store, service, seed) = setup().await;
    let id = pending_request(&service, &seed).await;
    store.fail_ledger_writes(true);

    let err = service
        .submit_status_change(&seed.admin, id, 6, RequestPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::LedgerUpdate(_)));

    let detail = service.request_detail(&seed.admin, id).await.unwrap();
    assert_eq!(detail.status, RequestStatus::PendingAdmin);
    assert_eq!(store.available_quantity(seed.asset.id), Some(2));

    // Transitions without a ledger effect are unaffected
    service
        .submit_status_change(&seed.admin, id, 2, RequestPatch::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_accepts_respect_available_quantity() {
    const N: usize = 8;
    let (store, service, seed) = setup().await;

    let mut ids = Vec::with_capacity(N);
    for _ in 0..N {
        ids.push(pending_request(&service, &seed).await);
    }

    let tasks = ids.into_iter().map(|id| {
        let service = service.clone();
        let admin = seed.admin.clone();
        tokio::spawn(async move {
            service
                .submit_status_change(&admin, id, 6, RequestPatch::default())
                .await
        })
    });
    let results = futures::future::join_all(tasks).await;

    let mut accepted = 0;
    let mut out_of_stock = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(LendingError::OutOfStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(out_of_stock, N - 2);
    assert_eq!(store.available_quantity(seed.asset.id), Some(0));
}

#[tokio::test]
async fn unknown_and_deleted_requests_are_not_found() {
    let (store, service, seed) = setup().await;
    let err = service
        .submit_status_change(&seed.admin, RequestId::new(999), 2, RequestPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::request_not_found(999));

    let id = pending_request(&service, &seed).await;
    assert!(store.soft_delete_request(id, test_clock_now()));
    let err = service
        .submit_status_change(&seed.admin, id, 2, RequestPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::NotFound { .. }));
}

fn test_clock_now() -> chrono::DateTime<chrono::Utc> {
    use asset_lending_core::environment::Clock;
    test_clock().now()
}

#[tokio::test]
async fn patch_can_move_request_to_another_asset() {
    let (store, service, seed) = setup().await;
    let other = fixtures::asset(store.as_ref(), &seed.category, "Laptop", 1)
        .await
        .unwrap();
    let id = pending_request(&service, &seed).await;

    service
        .submit_status_change(
            &seed.admin,
            id,
            6,
            RequestPatch {
                asset_id: Some(other.id),
                ..RequestPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(store.available_quantity(other.id), Some(0));
    assert_eq!(store.available_quantity(seed.asset.id), Some(2));

    let err = service
        .submit_status_change(
            &seed.admin,
            id,
            7,
            RequestPatch {
                asset_id: Some(AssetId::new(4242)),
                ..RequestPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::asset_not_found(4242));
}

#[tokio::test]
async fn manager_cannot_file_requests() {
    let (_store, service, seed) = setup().await;
    let err = service
        .create_request(&seed.manager, seed.request_for_asset())
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::Unauthorized);
}

#[tokio::test]
async fn create_for_unknown_asset_is_not_found() {
    let (_store, service, seed) = setup().await;
    let mut input = seed.request_for_asset();
    input.asset_id = AssetId::new(777);
    let err = service
        .create_request(&seed.employee, input)
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::asset_not_found(777));
}

#[tokio::test]
async fn role_scoped_listings() {
    let (_store, service, seed) = setup().await;
    let first = pending_request(&service, &seed).await; // status 1
    let second = pending_request(&service, &seed).await;
    service
        .submit_status_change(&seed.admin, second, 2, RequestPatch::default())
        .await
        .unwrap();

    let all = RequestQuery::default().into_filter().unwrap();
    let admin_view = service.list_requests(&seed.admin, &all).await.unwrap();
    assert_eq!(admin_view.data.len(), 2);
    assert_eq!(admin_view.total_page, 0);

    // Manager does not see status 1
    let manager_view = service.list_requests(&seed.manager, &all).await.unwrap();
    assert_eq!(
        manager_view.data.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second]
    );

    let new_only = RequestQuery {
        status: Some("new".to_string()),
        limit: Some("1".to_string()),
        ..RequestQuery::default()
    }
    .into_filter()
    .unwrap();
    let page = service.list_requests(&seed.admin, &new_only).await.unwrap();
    assert_eq!(page.total_page, 1);
    assert_eq!(page.data[0].id, first);
}

#[tokio::test]
async fn employee_activity_and_history() {
    let (_store, service, seed) = setup().await;
    let active = pending_request(&service, &seed).await;
    let borrowed = pending_request(&service, &seed).await;
    service
        .submit_status_change(&seed.admin, borrowed, 6, RequestPatch::default())
        .await
        .unwrap();

    let activity = service
        .employee_requests(&seed.employee, ActivityBucket::Active, Page::default())
        .await
        .unwrap();
    assert_eq!(activity.data.iter().map(|r| r.id).collect::<Vec<_>>(), vec![active]);

    let history = service
        .employee_requests(&seed.employee, ActivityBucket::History, Page::new(1, 0))
        .await
        .unwrap();
    assert_eq!(history.data.iter().map(|r| r.id).collect::<Vec<_>>(), vec![borrowed]);
    assert_eq!(history.total_page, 1);

    // Another employee's view is empty
    let stranger = service
        .employee_requests(&seed.admin, ActivityBucket::All, Page::default())
        .await
        .unwrap();
    assert!(stranger.data.is_empty());
}

#[tokio::test]
async fn employees_only_see_their_own_request_detail() {
    let (store, service, seed) = setup().await;
    let other = fixtures::user(store.as_ref(), "Rina", asset_lending_core::types::Role::Employee)
        .await
        .unwrap();
    let id = pending_request(&service, &seed).await;

    assert!(service.request_detail(&seed.employee, id).await.is_ok());
    assert!(service.request_detail(&seed.manager, id).await.is_ok());
    let err = service
        .request_detail(&fixtures::actor(&other), id)
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::request_not_found(id.get()));
}

#[tokio::test]
async fn asset_capacity_cannot_drop_below_loaned_units() {
    let (store, service, seed) = setup().await;
    let id = pending_request(&service, &seed).await;
    service
        .submit_status_change(&seed.admin, id, 6, RequestPatch::default())
        .await
        .unwrap();

    let grown = service
        .update_asset(
            &seed.admin,
            seed.asset.id,
            AssetPatch {
                initial_quantity: Some(5),
                ..AssetPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!((grown.initial_quantity, grown.available_quantity), (5, 4));

    let err = service
        .update_asset(
            &seed.admin,
            seed.asset.id,
            AssetPatch {
                initial_quantity: Some(0),
                ..AssetPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LendingError::CapacityBelowLoaned {
            asset_id: seed.asset.id,
            requested: 0,
            on_loan: 1
        }
    );
    assert_eq!(store.available_quantity(seed.asset.id), Some(4));

    let err = service
        .update_asset(&seed.employee, seed.asset.id, AssetPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, LendingError::Unauthorized);
}

#[tokio::test]
async fn summary_and_usage() {
    let (store, service, seed) = setup().await;
    let mut maintenance = fixtures::asset(store.as_ref(), &seed.category, "Printer", 3)
        .await
        .unwrap();
    maintenance = service
        .update_asset(
            &seed.admin,
            maintenance.id,
            AssetPatch {
                is_maintenance: Some(true),
                ..AssetPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(maintenance.is_maintenance);

    let id = pending_request(&service, &seed).await;
    service
        .submit_status_change(&seed.admin, id, 6, RequestPatch::default())
        .await
        .unwrap();

    let summary = service.asset_summary().await.unwrap();
    assert_eq!(summary.total_asset, 5);
    assert_eq!(summary.available, 4);
    assert_eq!(summary.in_use, 1);
    assert_eq!(summary.maintenance, 3);

    let usage = service
        .asset_usage(seed.asset.id, Page::default())
        .await
        .unwrap();
    assert_eq!(usage.history.len(), 1);
    assert_eq!(usage.history[0].name, "Budi");
    assert_eq!(usage.history[0].status, RequestStatus::Accepted.description());
}
