//! Pull, optimistic toggle and push flows

use crate::common::*;
use crate::{assert_err, assert_favorites, assert_ok};
use ardelyoum::client::{PullOutcome, SyncStatus};
use ardelyoum::shared::{Operation, SyncError, SyncEvent, UserSession};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_login_pulls_remote_favorites() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA", "offerB"]);

    let outcome = h.coordinator.on_session_start(UserSession::new("u1")).await;
    assert_matches!(outcome, PullOutcome::Synced { count: 2 });

    assert!(h.coordinator.is_favorite(&item("offerA")));
    assert!(h.coordinator.is_favorite(&item("offerB")));
    assert!(!h.coordinator.is_favorite(&item("offerC")));
    assert_eq!(h.store.read_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_offline_toggle_stays_favorited_after_retry_cap() {
    let h = Harness::new(manual_config());
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.store.fail_next_applies(3, SyncError::network("offline"));
    let mut events = h.coordinator.events();

    assert!(assert_ok!(h.coordinator.request_toggle(&item("offerC")).await));
    h.coordinator.flush_pending().await;
    tokio::time::advance(BASE_DELAY).await;
    h.coordinator.flush_pending().await;
    tokio::time::advance(BASE_DELAY * 2).await;
    let report = h.coordinator.flush_pending().await;

    assert_eq!(report.stalled, 1);
    assert_eq!(h.store.apply_call_count(), 3);
    assert!(h.coordinator.is_favorite(&item("offerC")));

    let error = h.coordinator.last_sync_error().expect("sync error is surfaced");
    assert!(!error.message.is_empty());
    assert_eq!(h.coordinator.health().borrow().status, SyncStatus::Unsynced);

    let mut stalled = false;
    while let Ok(event) = events.try_recv() {
        stalled |= matches!(event, SyncEvent::DeltaStalled { .. });
    }
    assert!(stalled);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_during_flight_is_sent_after_completion() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.store.set_apply_latency(Duration::from_millis(500));

    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    let first = tokio::spawn({
        let coordinator = h.coordinator.clone();
        async move { coordinator.flush_pending().await }
    });
    tokio::task::yield_now().await;

    // Back on while the remove is on the wire
    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    assert_eq!(h.coordinator.flush_pending().await.dispatched, 0);

    assert_eq!(first.await.unwrap().confirmed, 1);
    let second = h.coordinator.flush_pending().await;
    assert_eq!(second.confirmed, 1);

    let operations: Vec<Operation> = h.store.apply_calls().iter().map(|c| c.operation).collect();
    assert_eq!(operations, vec![Operation::Remove, Operation::Add]);
    assert!(h.store.favorites(&user("u1")).unwrap().contains(&item("offerA")));
    assert_favorites!(h.coordinator, ["offerA"]);
}

#[tokio::test]
async fn test_toggles_on_distinct_items_are_independent() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;

    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    h.coordinator.request_toggle(&item("offerB")).await.unwrap();
    h.coordinator.request_toggle(&item("offerC")).await.unwrap();

    let report = h.coordinator.flush_pending().await;
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.confirmed, 3);

    let remote = h.store.favorites(&user("u1")).unwrap();
    assert_eq!(remote.to_vec().len(), 2);
    assert_favorites!(h.coordinator, ["offerB", "offerC"]);
}

#[tokio::test(start_paused = true)]
async fn test_push_timeout_is_retried() {
    let h = Harness::new(manual_config());
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.store.set_apply_latency(FLUSH_TIMEOUT * 2);

    h.coordinator.request_toggle(&item("offerC")).await.unwrap();
    let report = h.coordinator.flush_pending().await;
    assert_eq!(report.retrying, 1);
    assert_matches!(
        h.coordinator.last_sync_error().map(|e| e.kind),
        Some(ardelyoum::shared::SyncErrorKind::Timeout)
    );

    h.store.set_apply_latency(Duration::ZERO);
    tokio::time::advance(BASE_DELAY).await;
    assert_eq!(h.coordinator.flush_pending().await.confirmed, 1);
    assert!(h.coordinator.last_sync_error().is_none());
}

#[tokio::test]
async fn test_toggle_requires_session() {
    let h = Harness::new(manual_config());
    assert_err!(
        h.coordinator.request_toggle(&item("offerA")).await,
        SyncError::NoActiveSession
    );
}

#[tokio::test(start_paused = true)]
async fn test_worker_and_watch_keep_devices_in_step() {
    let h = Harness::new(background_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;

    h.coordinator.request_toggle(&item("offerB")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(h.store.favorites(&user("u1")).unwrap().contains(&item("offerB")));

    // Another device removes offerA
    h.store.seed(&user("u1"), ["offerB"]);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_favorites!(h.coordinator, ["offerB"]);
    assert!(h.coordinator.health().borrow().is_healthy());
}
