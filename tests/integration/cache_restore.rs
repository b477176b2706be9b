//! Cached favorites and unsent changes across restarts

use crate::assert_favorites;
use crate::common::*;
use ardelyoum::client::offline::PendingChange;
use ardelyoum::client::{
    CachedFavorites, FavoritesCache, InMemoryRemoteStore, JsonFileCache, MemoryCache,
    PullOutcome, SyncCoordinator, SyncStatus,
};
use ardelyoum::shared::{SyncError, UserSession};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn cached_for(id: &str) -> CachedFavorites {
    CachedFavorites::new(
        user(id),
        ["offerA", "offerC"].into_iter().collect(),
        vec![PendingChange {
            item_id: item("offerC"),
            desired: true,
        }],
    )
}

#[tokio::test]
async fn test_cached_favorites_render_when_pull_fails() {
    let h = Harness::with_cache(manual_config(), MemoryCache::with(cached_for("u1")));
    h.store.fail_next_read(SyncError::network("offline"));

    let outcome = h.coordinator.on_session_start(UserSession::new("u1")).await;
    assert_matches!(outcome, PullOutcome::Degraded(_));
    assert_favorites!(h.coordinator, ["offerA", "offerC"]);
    assert_eq!(h.coordinator.health().borrow().status, SyncStatus::Degraded);

    // The unsent change still goes out
    let report = h.coordinator.flush_pending().await;
    assert_eq!(report.confirmed, 1);
    assert!(h.store.favorites(&user("u1")).unwrap().contains(&item("offerC")));
}

#[tokio::test]
async fn test_confirmed_push_clears_degraded_status() {
    let h = Harness::with_cache(manual_config(), MemoryCache::with(cached_for("u1")));
    h.store.fail_next_read(SyncError::network("offline"));
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    assert_eq!(h.coordinator.health().borrow().status, SyncStatus::Degraded);

    h.coordinator.request_toggle(&item("offerB")).await.unwrap();
    assert_eq!(h.coordinator.flush_pending().await.confirmed, 2);

    let health = h.coordinator.health().borrow().clone();
    assert_eq!(health.status, SyncStatus::Synced);
    assert!(health.last_sync_error.is_none());
    assert!(health.last_synced_at.is_some());
}

#[tokio::test]
async fn test_cache_of_another_user_is_never_shown() {
    let h = Harness::with_cache(manual_config(), MemoryCache::with(cached_for("u1")));
    h.store.fail_next_read(SyncError::network("offline"));

    h.coordinator.on_session_start(UserSession::new("u2")).await;
    assert!(h.coordinator.favorites().ids.is_empty());
    assert_eq!(h.coordinator.flush_pending().await.dispatched, 0);
}

#[tokio::test]
async fn test_remote_wins_over_cache_when_pull_succeeds() {
    let h = Harness::with_cache(manual_config(), MemoryCache::with(cached_for("u1")));
    h.store.seed(&user("u1"), ["offerB", "offerC"]);

    h.coordinator.on_session_start(UserSession::new("u1")).await;

    // offerA was only cached; offerC is already on the remote
    assert_favorites!(h.coordinator, ["offerB", "offerC"]);
    assert_eq!(h.coordinator.queue_stats().await.total, 0);
    assert_eq!(h.coordinator.flush_pending().await.dispatched, 0);
}

#[tokio::test]
async fn test_logout_clears_cache() {
    let h = Harness::new(manual_config());
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    assert!(h.cache.load().await.unwrap().is_some());

    h.coordinator.on_session_end().await;
    assert!(h.cache.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_restart_resends_unsent_toggle() {
    let h = Harness::new(manual_config());
    h.store.seed(&user("u1"), ["offerA"]);
    h.coordinator.on_session_start(UserSession::new("u1")).await;
    h.coordinator.request_toggle(&item("offerA")).await.unwrap();
    h.coordinator.shutdown().await;

    let restarted = h.restart(manual_config());
    restarted.on_session_start(UserSession::new("u1")).await;
    assert!(!restarted.is_favorite(&item("offerA")));

    assert_eq!(restarted.flush_pending().await.confirmed, 1);
    assert!(h.store.favorites(&user("u1")).unwrap().is_empty());
}

#[tokio::test]
async fn test_json_cache_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    let store = Arc::new(InMemoryRemoteStore::new());
    store.seed(&user("u1"), ["offerA"]);

    let first = SyncCoordinator::new(
        store.clone(),
        Arc::new(JsonFileCache::new(&path)),
        manual_config(),
    );
    first.on_session_start(UserSession::new("u1")).await;
    first.request_toggle(&item("offerB")).await.unwrap();
    first.shutdown().await;

    let cache = JsonFileCache::new(&path);
    let cached = cache.load().await.unwrap().expect("cache written");
    assert_eq!(cached.user_id, user("u1"));
    assert_eq!(cached.pending.len(), 1);

    store.fail_next_read(SyncError::network("offline"));
    let second = SyncCoordinator::new(store.clone(), Arc::new(cache), manual_config());
    second.on_session_start(UserSession::new("u1")).await;
    assert_favorites!(second, ["offerA", "offerB"]);
}
