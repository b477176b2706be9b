//! # Favorites Sync Coordinator
//!
//! Bridges the local favorites state and the remote favorites store without
//! letting network latency block interaction, and without losing or
//! duplicating the user's intent.
//!
//! ## Architecture
//!
//! - **Local state**: optimistic favorites set, mutated only here
//! - **Delta queue**: coalesced per-item intents awaiting the remote
//! - **Background**: flush worker and real-time watch, one of each per session
//! - **Sync health**: observable status and `last_sync_error`
//! - **Metrics**: push, pull and guard counters
//!
//! ## Session scope
//!
//! Every session start bumps a generation number. Deltas, flush results and
//! watch snapshots carry the generation they were produced under and are
//! discarded when it is no longer current, so a slow response from a
//! previous user never reaches the next user's favorites. Ending a session
//! aborts the session's background tasks instead of awaiting them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ardelyoum::client::local_cache::MemoryCache;
//! use ardelyoum::client::remote::InMemoryRemoteStore;
//! use ardelyoum::client::sync::SyncCoordinator;
//! use ardelyoum::shared::{ItemId, SyncConfig, UserSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> ardelyoum::shared::error::Result<()> {
//! let coordinator = SyncCoordinator::new(
//!     Arc::new(InMemoryRemoteStore::new()),
//!     Arc::new(MemoryCache::new()),
//!     SyncConfig::default(),
//! );
//!
//! coordinator.on_session_start(UserSession::new("u1")).await;
//! let favorited = coordinator.request_toggle(&ItemId::from("offerA")).await?;
//! assert!(favorited);
//!
//! coordinator.on_session_end().await;
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod metrics;
pub mod sync_state;

pub use background::SessionListener;
pub use metrics::SyncMetrics;
pub use sync_state::{SyncHealth, SyncStatus};

use crate::client::favorites::{FavoritesView, LocalFavoritesState};
use crate::client::local_cache::{CachedFavorites, FavoritesCache};
use crate::client::offline::{
    CompletionOutcome, DeltaQueue, EnqueueOutcome, QueueStats, ReconciliationResult, Reconciler,
    RetryPolicy, SyncDelta,
};
use crate::client::remote::{RemoteFavoritesStore, RemoteSnapshot};
use crate::shared::config::SyncConfig;
use crate::shared::error::{Result, SyncError, SyncErrorReport};
use crate::shared::event::SyncEvent;
use crate::shared::favorites::{FavoriteSet, ItemId, UserId};
use crate::shared::session::UserSession;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of pulling remote favorites
#[derive(Debug, Clone)]
pub enum PullOutcome {
    /// Remote set applied
    Synced { count: usize },
    /// No favorites document yet; treated as an empty set
    Empty,
    /// Pull failed; local favorites are the cached fallback
    Degraded(SyncError),
    /// The session changed while the pull was outstanding
    Superseded,
}

/// Counts from one `flush_pending` pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub dispatched: usize,
    /// Accepted by the remote
    pub confirmed: usize,
    pub retrying: usize,
    pub stalled: usize,
    pub rejected: usize,
    /// Failed, but a later toggle made the failure moot or replaced it
    pub resolved: usize,
    /// Discarded by the session guard
    pub dropped: usize,
}

/// Cache change captured under the state lock
#[derive(Debug)]
enum CacheWrite {
    Store(CachedFavorites),
    Clear,
}

/// A [`CacheWrite`] stamped with the order it was captured in
#[derive(Debug)]
struct PendingWrite {
    revision: u64,
    write: CacheWrite,
}

/// Per-session state
#[derive(Debug)]
struct ActiveSession {
    session: UserSession,
    generation: u64,
    queue: DeltaQueue,
    reconciler: Reconciler,
    pulling: bool,
    pull_failed: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl ActiveSession {
    fn user_id(&self) -> &UserId {
        &self.session.user_id
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    active: Option<ActiveSession>,
    next_generation: u64,
    metrics: SyncMetrics,
}

impl CoordinatorState {
    /// Active session if it is still `generation`
    fn session_at(&mut self, generation: u64) -> Option<&mut ActiveSession> {
        self.active
            .as_mut()
            .filter(|active| active.generation == generation)
    }
}

struct Inner {
    store: Arc<dyn RemoteFavoritesStore>,
    cache: Arc<dyn FavoritesCache>,
    config: SyncConfig,
    policy: RetryPolicy,
    favorites: LocalFavoritesState,
    health: watch::Sender<SyncHealth>,
    events: broadcast::Sender<SyncEvent>,
    wake: Notify,
    state: Mutex<CoordinatorState>,
    cache_revision: AtomicU64,
    /// Revision of the last write handed to the cache
    cache_written: Mutex<u64>,
}

/// Session-scoped favorites sync coordinator
///
/// Cheap to clone; clones share one coordinator.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("config", &self.inner.config)
            .field("favorites", &self.inner.favorites)
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn RemoteFavoritesStore>,
        cache: Arc<dyn FavoritesCache>,
        config: SyncConfig,
    ) -> Self {
        let (health, _) = watch::channel(SyncHealth::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                policy: RetryPolicy::from_config(&config),
                store,
                cache,
                config,
                favorites: LocalFavoritesState::new(),
                health,
                events,
                wake: Notify::new(),
                state: Mutex::new(CoordinatorState::default()),
                cache_revision: AtomicU64::new(0),
                cache_written: Mutex::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // ---- Session lifecycle ----

    /// Activate `session` and pull its favorites
    ///
    /// Starting the user that is already active adopts the new session's
    /// claims and re-pulls without touching the queue. Starting another user
    /// ends the current session first.
    pub async fn on_session_start(&self, session: UserSession) -> PullOutcome {
        let cached = match self.inner.cache.load_for(&session.user_id).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("[Cache] Failed to load favorites cache: {}", e);
                None
            }
        };

        let (generation, previous) = {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            if let Some(active) = state
                .active
                .as_mut()
                .filter(|active| active.session.user_id == session.user_id)
            {
                active.session = session;
                drop(guard);
                return self.resync().await;
            }
            let previous = state
                .active
                .take()
                .map(|previous| self.finish_session(previous, true));

            state.next_generation += 1;
            let generation = state.next_generation;
            let user_id = session.user_id.clone();
            let mut queue = DeltaQueue::new(user_id.clone(), generation);
            queue.set_remote_known(false);

            let mut local = FavoriteSet::new();
            if let Some(cached) = cached {
                tracing::debug!(
                    "[Sync] Restored {} favorites and {} unsent changes for {}",
                    cached.ids.len(),
                    cached.pending.len(),
                    user_id
                );
                local = cached.ids;
                for change in cached.pending {
                    queue.restore(change);
                }
                queue.overlay(&mut local);
            }
            self.inner.favorites.initialize(user_id.clone(), local);

            state.active = Some(ActiveSession {
                session,
                generation,
                queue,
                reconciler: Reconciler::new(),
                pulling: true,
                pull_failed: false,
                tasks: Vec::new(),
            });
            tracing::info!("[Sync] Session started for {} (generation {})", user_id, generation);
            self.emit(SyncEvent::SessionStarted { user_id });
            self.refresh_health(state, |_| {});
            (generation, previous)
        };
        if let Some(write) = previous {
            self.write_cache(write).await;
        }

        let outcome = self.pull(generation).await;
        self.start_background(generation).await;
        outcome
    }

    /// Abandon the session: cancel its tasks, drop its queue, clear favorites
    pub async fn on_session_end(&self) {
        let write = {
            let mut state = self.inner.state.lock().await;
            let write = state
                .active
                .take()
                .map(|active| self.finish_session(active, true));
            self.refresh_health(&state, |_| {});
            write
        };
        if let Some(write) = write {
            self.write_cache(write).await;
        }
    }

    /// Stop background work at process teardown, keeping the cache
    pub async fn shutdown(&self) {
        let write = {
            let mut state = self.inner.state.lock().await;
            let write = state
                .active
                .take()
                .map(|active| self.finish_session(active, false));
            self.refresh_health(&state, |_| {});
            write
        };
        if let Some(write) = write {
            self.write_cache(write).await;
        }
    }

    /// Tear down `active`; the returned write clears or keeps the cache
    fn finish_session(&self, mut active: ActiveSession, logout: bool) -> PendingWrite {
        active.abort_tasks();
        let write = if logout {
            let abandoned = active.queue.abandon();
            tracing::info!(
                "[Sync] Session ended for {}, abandoned {} pending changes",
                active.user_id(),
                abandoned
            );
            self.emit(SyncEvent::SessionEnded {
                user_id: active.user_id().clone(),
                abandoned,
            });
            self.stamp(CacheWrite::Clear)
        } else {
            let write = self.cache_snapshot(&active);
            tracing::info!("[Sync] Shut down session for {}", active.user_id());
            write
        };
        self.inner.favorites.clear();
        write
    }

    /// Re-pull the active session's favorites
    pub async fn resync(&self) -> PullOutcome {
        let generation = {
            let mut state = self.inner.state.lock().await;
            let Some(active) = state.active.as_mut() else {
                return PullOutcome::Superseded;
            };
            active.pulling = true;
            let generation = active.generation;
            self.refresh_health(&state, |_| {});
            generation
        };
        self.pull(generation).await
    }

    async fn pull(&self, generation: u64) -> PullOutcome {
        let user_id = {
            let mut state = self.inner.state.lock().await;
            match state.session_at(generation) {
                Some(active) => active.user_id().clone(),
                None => return PullOutcome::Superseded,
            }
        };

        let limit = self.inner.config.flush_timeout;
        let result = with_timeout(limit, self.inner.store.read_favorites(&user_id)).await;

        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        let Some(active) = state.session_at(generation) else {
            tracing::debug!("[Sync] Discarding pull for {}: session changed", user_id);
            return PullOutcome::Superseded;
        };
        active.pulling = false;

        let (snapshot, outcome) = match result {
            Ok(snapshot) => {
                let count = snapshot.ids.len();
                (snapshot, PullOutcome::Synced { count })
            }
            Err(SyncError::NotFound) => (
                RemoteSnapshot {
                    ids: FavoriteSet::new(),
                    version: 0,
                },
                PullOutcome::Empty,
            ),
            Err(error) => {
                active.pull_failed = true;
                state.metrics.pull_failures += 1;
                let report = SyncErrorReport::new(&error, None);
                tracing::warn!("[Sync] Pull failed for {}: {}", user_id, error);
                self.emit(SyncEvent::PullFailed {
                    user_id,
                    report: report.clone(),
                });
                self.refresh_health(state, |health| health.last_sync_error = Some(report));
                return PullOutcome::Degraded(error);
            }
        };

        active.pull_failed = false;
        active.queue.set_remote_known(true);
        match active.reconciler.reconcile(&snapshot, &mut active.queue) {
            ReconciliationResult::Applied { merged, .. } => {
                self.inner.favorites.initialize(user_id.clone(), merged);
            }
            ReconciliationResult::Stale { version, latest } => {
                // The watch already delivered something newer
                tracing::debug!("[Sync] Pulled version {} older than {}", version, latest);
            }
        }
        let write = self.cache_snapshot(active);
        state.metrics.pulls += 1;
        tracing::info!("[Sync] Pulled {} favorites for {}", snapshot.ids.len(), user_id);
        self.emit(SyncEvent::PullCompleted {
            user_id,
            count: snapshot.ids.len(),
        });
        self.refresh_health(state, |health| {
            health.last_sync_error = None;
            health.last_synced_at = Some(chrono::Utc::now());
        });
        drop(guard);

        self.write_cache(write).await;
        self.inner.wake.notify_one();
        outcome
    }

    // ---- Local mutations ----

    /// Toggle `item_id` optimistically and queue the push
    ///
    /// Returns the new membership. Fails only with `NoActiveSession`.
    pub async fn request_toggle(&self, item_id: &ItemId) -> Result<bool> {
        let (member, write) = {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            let Some(active) = state.active.as_mut() else {
                return Err(SyncError::NoActiveSession);
            };

            let member = self.inner.favorites.toggle(item_id)?;
            let outcome = active.queue.record_toggle(item_id, member);
            let write = self.cache_snapshot(active);
            match outcome {
                EnqueueOutcome::Queued => {}
                EnqueueOutcome::Superseded | EnqueueOutcome::Deferred => {
                    state.metrics.coalesced += 1
                }
                EnqueueOutcome::Cancelled => {
                    state.metrics.cancelled += 1;
                    tracing::debug!("[Queue] Toggle on {} cancelled a queued change", item_id);
                }
            }
            self.refresh_health(state, |_| {});
            (member, write)
        };

        self.write_cache(write).await;
        self.inner.wake.notify_one();
        Ok(member)
    }

    /// Re-arm changes that exhausted their retries
    pub async fn retry_stalled(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let Some(active) = state.active.as_mut() else {
            return 0;
        };
        let count = active.queue.rearm_stalled();
        if count > 0 {
            tracing::info!("[Queue] Re-armed {} stalled changes", count);
            self.refresh_health(&state, |_| {});
            self.inner.wake.notify_one();
        }
        count
    }

    // ---- Remote pushes ----

    /// Dispatch every ready delta once and wait for the results
    pub async fn flush_pending(&self) -> FlushReport {
        let deltas = {
            let mut state = self.inner.state.lock().await;
            let Some(active) = state.active.as_mut() else {
                return FlushReport::default();
            };
            let deltas = active.queue.take_ready(Instant::now());
            if !deltas.is_empty() {
                self.refresh_health(&state, |_| {});
            }
            deltas
        };

        let mut report = FlushReport {
            dispatched: deltas.len(),
            ..FlushReport::default()
        };
        let outcomes =
            futures_util::future::join_all(deltas.into_iter().map(|delta| self.flush(delta))).await;
        for outcome in outcomes {
            match outcome {
                CompletionOutcome::Retired | CompletionOutcome::Requeued => report.confirmed += 1,
                CompletionOutcome::Retrying { .. } => report.retrying += 1,
                CompletionOutcome::Stalled => report.stalled += 1,
                CompletionOutcome::Rejected => report.rejected += 1,
                CompletionOutcome::Resolved | CompletionOutcome::Replaced => report.resolved += 1,
                CompletionOutcome::Stale => report.dropped += 1,
            }
        }
        report
    }

    /// Send one delta to the remote store and settle its queue entry
    ///
    /// Only a delta its queue entry is waiting on goes out; duplicates and
    /// deltas from an earlier session are dropped as `Stale`.
    pub async fn flush(&self, delta: SyncDelta) -> CompletionOutcome {
        if !self.is_dispatchable(&delta).await {
            tracing::debug!(
                "[Sync] Dropping {} {} from generation {}: not in flight",
                delta.operation,
                delta.item_id,
                delta.generation
            );
            self.inner.state.lock().await.metrics.dropped_stale += 1;
            return CompletionOutcome::Stale;
        }

        let started = Instant::now();
        let limit = self.inner.config.flush_timeout;
        let result = with_timeout(
            limit,
            self.inner
                .store
                .apply_delta(&delta.user_id, &delta.item_id, delta.operation),
        )
        .await;

        let (outcome, write) = {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            let Some(active) = state.session_at(delta.generation) else {
                tracing::debug!(
                    "[Sync] Discarding result for {} {}: session changed",
                    delta.operation,
                    delta.item_id
                );
                state.metrics.dropped_stale += 1;
                return CompletionOutcome::Stale;
            };

            let outcome = match &result {
                Ok(()) => active.queue.complete_success(&delta),
                Err(error) => active.queue.complete_failure(
                    &delta,
                    error,
                    &self.inner.policy,
                    Instant::now(),
                ),
            };
            if outcome == CompletionOutcome::Stale {
                tracing::debug!(
                    "[Sync] Discarding result for {} {}: entry settled elsewhere",
                    delta.operation,
                    delta.item_id
                );
                state.metrics.dropped_stale += 1;
                return CompletionOutcome::Stale;
            }
            if result.is_ok() {
                // A confirmed push proves the remote reachable again
                active.pull_failed = false;
            }
            let write = self.cache_snapshot(active);

            match &result {
                Ok(()) => {
                    state.metrics.record_push_success(started.elapsed());
                    tracing::debug!("[Sync] Confirmed {} {}", delta.operation, delta.item_id);
                    self.emit(SyncEvent::DeltaConfirmed {
                        item_id: delta.item_id.clone(),
                        operation: delta.operation,
                    });
                    self.refresh_health(state, |health| {
                        health.last_sync_error = None;
                        health.last_synced_at = Some(chrono::Utc::now());
                    });
                }
                Err(error)
                    if matches!(
                        outcome,
                        CompletionOutcome::Resolved | CompletionOutcome::Replaced
                    ) =>
                {
                    state.metrics.record_push_failure();
                    tracing::debug!(
                        "[Sync] {} {} failed but a newer toggle took over: {}",
                        delta.operation,
                        delta.item_id,
                        error
                    );
                    self.refresh_health(state, |_| {});
                }
                Err(error) => {
                    state.metrics.record_push_failure();
                    let report = SyncErrorReport::new(error, Some(delta.item_id.clone()));
                    match &outcome {
                        CompletionOutcome::Retrying { attempt } => {
                            state.metrics.retries += 1;
                            tracing::warn!(
                                "[Sync] {} {} failed (attempt {}): {}, retrying",
                                delta.operation,
                                delta.item_id,
                                attempt,
                                error
                            );
                        }
                        CompletionOutcome::Stalled => {
                            state.metrics.stalled += 1;
                            tracing::warn!(
                                "[Sync] {} {} gave up after {} attempts: {}",
                                delta.operation,
                                delta.item_id,
                                delta.attempt,
                                error
                            );
                            self.emit(SyncEvent::DeltaStalled {
                                item_id: delta.item_id.clone(),
                                report: report.clone(),
                            });
                        }
                        CompletionOutcome::Rejected => {
                            state.metrics.rejected += 1;
                            tracing::error!(
                                "[Sync] {} {} rejected: {}",
                                delta.operation,
                                delta.item_id,
                                error
                            );
                            self.emit(SyncEvent::DeltaRejected {
                                item_id: delta.item_id.clone(),
                                report: report.clone(),
                            });
                        }
                        _ => {}
                    }
                    self.refresh_health(state, |health| health.last_sync_error = Some(report));
                }
            }
            (outcome, write)
        };

        self.write_cache(write).await;
        if matches!(
            outcome,
            CompletionOutcome::Requeued
                | CompletionOutcome::Replaced
                | CompletionOutcome::Retrying { .. }
        ) {
            self.inner.wake.notify_one();
        }
        outcome
    }

    async fn is_dispatchable(&self, delta: &SyncDelta) -> bool {
        let mut state = self.inner.state.lock().await;
        state
            .session_at(delta.generation)
            .is_some_and(|active| active.queue.is_in_flight(delta))
    }

    // ---- Real-time snapshots ----

    /// Reconcile a snapshot delivered for `generation`
    ///
    /// Returns false once the session has moved on.
    pub(crate) async fn apply_remote_snapshot(
        &self,
        generation: u64,
        snapshot: RemoteSnapshot,
    ) -> bool {
        let write = {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            let Some(active) = state.session_at(generation) else {
                return false;
            };

            match active.reconciler.reconcile(&snapshot, &mut active.queue) {
                ReconciliationResult::Applied {
                    version, merged, ..
                } => {
                    let count = merged.len();
                    let user_id = active.user_id().clone();
                    active.queue.set_remote_known(true);
                    active.pull_failed = false;
                    self.inner.favorites.replace_ids(&user_id, merged);
                    let write = self.cache_snapshot(active);
                    state.metrics.snapshots_applied += 1;
                    tracing::debug!(
                        "[Sync] Applied remote snapshot v{} ({} favorites)",
                        version,
                        count
                    );
                    self.emit(SyncEvent::RemoteSnapshotApplied { version, count });
                    self.refresh_health(state, |health| {
                        health.last_synced_at = Some(chrono::Utc::now());
                    });
                    Some(write)
                }
                ReconciliationResult::Stale { version, latest } => {
                    state.metrics.snapshots_discarded += 1;
                    tracing::debug!("[Sync] Discarded snapshot v{} (have v{})", version, latest);
                    None
                }
            }
        };

        if let Some(write) = write {
            self.write_cache(write).await;
        }
        true
    }

    // ---- Observation ----

    pub fn is_favorite(&self, item_id: &ItemId) -> bool {
        self.inner.favorites.contains(item_id)
    }

    pub fn favorites(&self) -> FavoritesView {
        self.inner.favorites.snapshot()
    }

    /// Observe the favorites set; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> watch::Receiver<FavoritesView> {
        self.inner.favorites.subscribe()
    }

    pub fn health(&self) -> watch::Receiver<SyncHealth> {
        self.inner.health.subscribe()
    }

    pub fn last_sync_error(&self) -> Option<SyncErrorReport> {
        self.inner.health.borrow().last_sync_error.clone()
    }

    /// Dismiss the current sync error banner
    pub fn dismiss_sync_error(&self) {
        self.inner.health.send_if_modified(|health| {
            health.last_sync_error.take().is_some()
        });
    }

    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    pub async fn current_session(&self) -> Option<UserSession> {
        let state = self.inner.state.lock().await;
        state.active.as_ref().map(|active| active.session.clone())
    }

    pub async fn metrics(&self) -> SyncMetrics {
        self.inner.state.lock().await.metrics.clone()
    }

    pub async fn queue_stats(&self) -> QueueStats {
        let state = self.inner.state.lock().await;
        state
            .active
            .as_ref()
            .map(|active| active.queue.stats())
            .unwrap_or_default()
    }

    // ---- Internals ----

    fn emit(&self, event: SyncEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    fn stamp(&self, write: CacheWrite) -> PendingWrite {
        PendingWrite {
            revision: self.inner.cache_revision.fetch_add(1, Ordering::Relaxed) + 1,
            write,
        }
    }

    /// Capture the favorites and unsent changes of `active` for the cache
    ///
    /// Must be called with the state lock held so revisions follow the order
    /// of state changes.
    fn cache_snapshot(&self, active: &ActiveSession) -> PendingWrite {
        self.stamp(CacheWrite::Store(CachedFavorites::new(
            active.user_id().clone(),
            self.inner.favorites.snapshot().ids,
            active.queue.pending_changes(),
        )))
    }

    /// Hand `pending` to the cache unless a later capture already landed
    async fn write_cache(&self, pending: PendingWrite) {
        let mut written = self.inner.cache_written.lock().await;
        if pending.revision <= *written {
            tracing::debug!("[Cache] Skipping superseded write r{}", pending.revision);
            return;
        }
        *written = pending.revision;
        let result = match &pending.write {
            CacheWrite::Store(cached) => self.inner.cache.store(cached).await,
            CacheWrite::Clear => self.inner.cache.clear().await,
        };
        if let Err(e) = result {
            tracing::warn!("[Cache] Failed to write favorites cache: {}", e);
        }
    }

    fn refresh_health(&self, state: &CoordinatorState, update: impl FnOnce(&mut SyncHealth)) {
        self.inner.health.send_if_modified(|health| {
            let before = health.clone();
            update(health);
            match state.active.as_ref() {
                None => *health = SyncHealth::default(),
                Some(active) => {
                    let stats = active.queue.stats();
                    health.pending = stats.total;
                    health.status = if active.pulling || stats.in_flight > 0 {
                        SyncStatus::Syncing
                    } else if stats.stalled > 0 {
                        SyncStatus::Unsynced
                    } else if active.pull_failed {
                        SyncStatus::Degraded
                    } else if stats.total > 0 {
                        SyncStatus::Syncing
                    } else {
                        SyncStatus::Synced
                    };
                }
            }
            *health != before
        });
    }

    pub(crate) fn wake(&self) -> &Notify {
        &self.inner.wake
    }

    /// Deadline of the next retry and whether anything is ready now
    pub(crate) async fn schedule(&self, generation: u64) -> Option<(bool, Option<Instant>)> {
        let mut state = self.inner.state.lock().await;
        let active = state.session_at(generation)?;
        Some((
            active.queue.has_ready(Instant::now()),
            active.queue.next_retry_at(),
        ))
    }

    async fn start_background(&self, generation: u64) {
        let watch = if self.inner.config.realtime {
            let user_id = {
                let mut state = self.inner.state.lock().await;
                match state.session_at(generation) {
                    Some(active) => active.user_id().clone(),
                    None => return,
                }
            };
            match self.inner.store.watch_favorites(&user_id).await {
                Ok(watch) => Some(watch),
                Err(SyncError::Unsupported(_)) => {
                    tracing::debug!("[Sync] Store has no real-time watch, polling only");
                    None
                }
                Err(e) => {
                    tracing::warn!("[Sync] Failed to open favorites watch for {}: {}", user_id, e);
                    None
                }
            }
        } else {
            None
        };

        let mut state = self.inner.state.lock().await;
        // The watch subscription is dropped with this scope if the session moved on
        let Some(active) = state.session_at(generation) else {
            return;
        };
        if self.inner.config.auto_flush {
            active
                .tasks
                .push(tokio::spawn(background::run_worker(self.clone(), generation)));
        }
        if let Some(watch) = watch {
            active
                .tasks
                .push(tokio::spawn(background::run_watch(self.clone(), generation, watch)));
        }
    }

    pub(crate) fn flush_debounce(&self) -> Duration {
        self.inner.config.flush_debounce
    }
}

async fn with_timeout<T>(limit: Duration, future: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, future)
        .await
        .unwrap_or(Err(SyncError::Timeout(limit)))
}
