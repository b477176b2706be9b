//! In-memory remote store
//!
//! Stands in for the backend document store in tests and in the demo
//! binary. Failures and latency can be injected per call, every mutation
//! attempt is recorded, and successful mutations are published to watchers.

use super::{FavoritesWatch, RemoteFavoritesStore, RemoteSnapshot, WatchPublisher};
use crate::shared::error::{Result, SyncError};
use crate::shared::favorites::{FavoriteSet, ItemId, Operation, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One `apply_delta` attempt, successful or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCall {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub operation: Operation,
}

#[derive(Debug, Default)]
struct Document {
    ids: FavoriteSet,
    version: u64,
}

impl Document {
    fn snapshot(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            ids: self.ids.clone(),
            version: self.version,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<UserId, Document>,
    read_faults: VecDeque<SyncError>,
    apply_faults: VecDeque<SyncError>,
    apply_latency: Duration,
    read_latency: Duration,
    calls: Vec<AppliedCall>,
    reads: usize,
    watchers: HashMap<UserId, Vec<WatchPublisher>>,
}

/// In-memory implementation of RemoteFavoritesStore
#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    state: Mutex<StoreState>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // Poisoning only follows a panicking test; keep the data usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or replace a user's document
    pub fn seed<'a>(&self, user_id: &UserId, ids: impl IntoIterator<Item = &'a str>) {
        let mut state = self.state();
        let doc = state.documents.entry(user_id.clone()).or_default();
        doc.ids = ids.into_iter().collect();
        doc.version += 1;
        let snapshot = doc.snapshot();
        Self::notify(&mut state, user_id, snapshot);
    }

    /// Current remote set for a user
    pub fn favorites(&self, user_id: &UserId) -> Option<FavoriteSet> {
        self.state().documents.get(user_id).map(|d| d.ids.clone())
    }

    /// Fail the next `read_favorites` call with `error`
    pub fn fail_next_read(&self, error: SyncError) {
        self.state().read_faults.push_back(error);
    }

    /// Fail the next `count` `apply_delta` calls with `error`
    pub fn fail_next_applies(&self, count: usize, error: SyncError) {
        let mut state = self.state();
        for _ in 0..count {
            state.apply_faults.push_back(error.clone());
        }
    }

    pub fn set_apply_latency(&self, latency: Duration) {
        self.state().apply_latency = latency;
    }

    pub fn set_read_latency(&self, latency: Duration) {
        self.state().read_latency = latency;
    }

    /// Every `apply_delta` attempt so far
    pub fn apply_calls(&self) -> Vec<AppliedCall> {
        self.state().calls.clone()
    }

    pub fn apply_call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn read_count(&self) -> usize {
        self.state().reads
    }

    /// Push a snapshot to watchers without touching the document
    pub fn publish(&self, user_id: &UserId, snapshot: RemoteSnapshot) {
        let mut state = self.state();
        Self::notify(&mut state, user_id, snapshot);
    }

    /// Open watches for a user
    pub fn watcher_count(&self, user_id: &UserId) -> usize {
        let mut state = self.state();
        let Some(watchers) = state.watchers.get_mut(user_id) else {
            return 0;
        };
        watchers.retain(|w| !w.is_closed());
        watchers.len()
    }

    fn notify(state: &mut StoreState, user_id: &UserId, snapshot: RemoteSnapshot) {
        if let Some(watchers) = state.watchers.get_mut(user_id) {
            watchers.retain(|w| w.publish(snapshot.clone()));
        }
    }
}

#[async_trait]
impl RemoteFavoritesStore for InMemoryRemoteStore {
    async fn read_favorites(&self, user_id: &UserId) -> Result<RemoteSnapshot> {
        let (fault, latency) = {
            let mut state = self.state();
            state.reads += 1;
            (state.read_faults.pop_front(), state.read_latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = fault {
            return Err(error);
        }

        self.state()
            .documents
            .get(user_id)
            .map(Document::snapshot)
            .ok_or(SyncError::NotFound)
    }

    async fn apply_delta(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        operation: Operation,
    ) -> Result<()> {
        let (fault, latency) = {
            let mut state = self.state();
            state.calls.push(AppliedCall {
                user_id: user_id.clone(),
                item_id: item_id.clone(),
                operation,
            });
            (state.apply_faults.pop_front(), state.apply_latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = fault {
            return Err(error);
        }

        let mut state = self.state();
        let doc = state.documents.entry(user_id.clone()).or_default();
        let before = doc.ids.contains(item_id);
        doc.ids.apply(item_id, operation);
        if before != operation.membership() {
            doc.version += 1;
            let snapshot = doc.snapshot();
            Self::notify(&mut state, user_id, snapshot);
        }
        Ok(())
    }

    async fn watch_favorites(&self, user_id: &UserId) -> Result<FavoritesWatch> {
        let (publisher, watch) = FavoritesWatch::channel();
        let mut state = self.state();
        if let Some(doc) = state.documents.get(user_id) {
            publisher.publish(doc.snapshot());
        }
        state
            .watchers
            .entry(user_id.clone())
            .or_default()
            .push(publisher);
        Ok(watch)
    }
}
