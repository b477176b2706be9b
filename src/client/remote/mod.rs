//! Remote favorites store
//!
//! The sync core depends on exactly two capabilities of the backend
//! document store, read and single-item mutation, plus an optional
//! real-time watch. Each mutation is an independent add-to-set or
//! remove-from-set, never an overwrite of the whole array, so deltas for
//! different items cannot clobber each other.

mod memory;

pub use memory::{AppliedCall, InMemoryRemoteStore};

use crate::shared::error::{Result, SyncError};
use crate::shared::favorites::{FavoriteSet, ItemId, Operation, UserId};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Favorites document as read at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub ids: FavoriteSet,
    /// Monotonic per-document version; higher supersedes lower
    pub version: u64,
}

/// Backend document store holding one favorites array per user
#[async_trait]
pub trait RemoteFavoritesStore: Send + Sync {
    /// Read the user's favorites
    ///
    /// Fails with `NotFound` when the user has no document yet, or
    /// `Network` on transport failure.
    async fn read_favorites(&self, user_id: &UserId) -> Result<RemoteSnapshot>;

    /// Apply a single add/remove to the user's favorites
    ///
    /// Fails with `Network` or `PermissionDenied`.
    async fn apply_delta(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        operation: Operation,
    ) -> Result<()>;

    /// Subscribe to real-time snapshots of the user's favorites
    async fn watch_favorites(&self, _user_id: &UserId) -> Result<FavoritesWatch> {
        Err(SyncError::Unsupported("watch_favorites"))
    }
}

/// Cancellable subscription to remote snapshots
///
/// Dropping the handle, or calling [`FavoritesWatch::unsubscribe`], ends
/// the subscription; the publisher observes it through
/// [`WatchPublisher::is_closed`].
#[derive(Debug)]
pub struct FavoritesWatch {
    rx: mpsc::UnboundedReceiver<RemoteSnapshot>,
}

impl FavoritesWatch {
    /// Create a publisher and its subscription handle
    pub fn channel() -> (WatchPublisher, FavoritesWatch) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WatchPublisher { tx }, FavoritesWatch { rx })
    }

    /// Next snapshot, `None` once the publisher is gone
    pub async fn next(&mut self) -> Option<RemoteSnapshot> {
        self.rx.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}

/// Producer side of a [`FavoritesWatch`]
#[derive(Debug, Clone)]
pub struct WatchPublisher {
    tx: mpsc::UnboundedSender<RemoteSnapshot>,
}

impl WatchPublisher {
    /// Deliver a snapshot; false once the subscriber is gone
    pub fn publish(&self, snapshot: RemoteSnapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
