//! Session boundaries: nothing from one user's session reaches the next

use crate::assert_favorites;
use crate::common::*;
use ardelyoum::client::{PullOutcome, SessionHub};
use ardelyoum::shared::{SyncError, SyncEvent, UserSession};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_logout_before_flush_resolves_spares_next_user() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.store.seed(&user("u2"), ["offerA", "offerZ"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;

    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    h.store.set_apply_latency(Duration::from_secs(1));
    let pending = tokio::spawn({
        let coordinator = h.coordinator.clone();
        async move { coordinator.flush_pending().await }
    });
    tokio::task::yield_now().await;

    h.coordinator.on_session_end().await;
    h.store.set_apply_latency(Duration::ZERO);
    h.coordinator.on_session_start(UserSession::new("u2")).await;
    assert_favorites!(h.coordinator, ["offerA", "offerZ"]);

    let report = pending.await.unwrap();
    assert_eq!(report.dropped, 1);
    assert_favorites!(h.coordinator, ["offerA", "offerZ"]);
    assert_eq!(h.coordinator.queue_stats().await.total, 0);
    assert!(h.coordinator.last_sync_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_is_not_surfaced_to_next_user() {
    let h = Harness::new(manual_config());
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.store.fail_next_applies(1, SyncError::permission_denied("rules"));
    h.store.set_apply_latency(Duration::from_secs(1));

    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    let pending = tokio::spawn({
        let coordinator = h.coordinator.clone();
        async move { coordinator.flush_pending().await }
    });
    tokio::task::yield_now().await;

    h.coordinator.on_session_start(UserSession::new("u2")).await;
    let mut events = h.coordinator.events();

    assert_eq!(pending.await.unwrap().dropped, 1);
    assert!(h.coordinator.last_sync_error().is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_pull_for_previous_user_is_superseded() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.store.seed(&user("u2"), ["offerB"]);
    h.store.set_read_latency(Duration::from_secs(1));

    let first = tokio::spawn({
        let coordinator = h.coordinator.clone();
        async move { coordinator.on_session_start(UserSession::new("u1")).await }
    });
    tokio::task::yield_now().await;

    h.store.set_read_latency(Duration::ZERO);
    h.coordinator.on_session_start(UserSession::new("u2")).await;

    assert_matches!(first.await.unwrap(), PullOutcome::Superseded);
    assert_favorites!(h.coordinator, ["offerB"]);
}

#[tokio::test]
async fn test_switching_users_clears_previous_favorites() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.coordinator.request_toggle(&item("offerB")).await.unwrap();
    let mut events = h.coordinator.events();

    h.coordinator.on_session_start(UserSession::new("u2")).await;
    assert!(h.coordinator.favorites().ids.is_empty());
    assert_eq!(h.coordinator.queue_stats().await.total, 0);

    let ended = events.try_recv().unwrap();
    assert_eq!(
        ended,
        SyncEvent::SessionEnded {
            user_id: user("u1"),
            abandoned: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_hub_logout_stops_background_pushes() {
    let h = Harness::new(background_config());
    let hub = SessionHub::new();
    let _listener = h.coordinator.attach(&hub);

    hub.start(UserSession::new("u1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.store.fail_next_applies(3, SyncError::network("offline"));
    h.coordinator.request_toggle(&item("offerC")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(h.store.apply_call_count(), 1);

    hub.end();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.store.apply_call_count(), 1);
    assert!(h.coordinator.favorites().user_id.is_none());
}
