//! # Snapshot Reconciliation
//!
//! Merges remote favorites snapshots with the unsent local intents.
//!
//! Snapshots arrive from the initial read and from the real-time watch, and
//! the watch may deliver them out of order. Each snapshot carries a
//! monotonic version; a snapshot not newer than the last applied one is
//! discarded. An admitted snapshot becomes the new remote baseline for the
//! delta queue, and the local view is the snapshot with every queued intent
//! laid over it, so an optimistic toggle is never erased by a snapshot taken
//! before the toggle reached the remote.

use crate::client::offline::queue::DeltaQueue;
use crate::client::remote::RemoteSnapshot;
use crate::shared::favorites::FavoriteSet;

/// Result of reconciling one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// Snapshot admitted; `merged` is the new local view
    Applied {
        version: u64,
        merged: FavoriteSet,
        /// Queue entries the snapshot already satisfied
        settled: usize,
    },
    /// Snapshot older than one already applied
    Stale { version: u64, latest: u64 },
}

/// Version gate plus merge for one session
#[derive(Debug, Default)]
pub struct Reconciler {
    latest: Option<u64>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `snapshot` if newer than anything applied, and merge it
    pub fn reconcile(
        &mut self,
        snapshot: &RemoteSnapshot,
        queue: &mut DeltaQueue,
    ) -> ReconciliationResult {
        if let Some(latest) = self.latest {
            if snapshot.version <= latest {
                return ReconciliationResult::Stale {
                    version: snapshot.version,
                    latest,
                };
            }
        }
        self.latest = Some(snapshot.version);

        let settled = queue.observe_remote(&snapshot.ids);
        let mut merged = snapshot.ids.clone();
        queue.overlay(&mut merged);

        ReconciliationResult::Applied {
            version: snapshot.version,
            merged,
            settled,
        }
    }
}
