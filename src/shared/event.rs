/**
 * Sync Event System
 *
 * Events broadcast by the sync coordinator to any interested listener
 * (banners, toasts, debug panels). Favorites contents are not carried here;
 * observers read those from the favorites watch channel.
 *
 * Events are delivered over `tokio::sync::broadcast`, so every subscriber
 * receives its own copy and a lagging subscriber only loses old events.
 */
use crate::shared::error::SyncErrorReport;
use crate::shared::favorites::{ItemId, Operation, UserId};
use serde::{Deserialize, Serialize};

/// Event emitted by the sync coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A user session became active
    SessionStarted { user_id: UserId },
    /// The active session ended and its pending work was abandoned
    SessionEnded { user_id: UserId, abandoned: usize },
    /// Remote favorites were pulled and applied
    PullCompleted { user_id: UserId, count: usize },
    /// The pull failed; the local set is a degraded fallback
    PullFailed { user_id: UserId, report: SyncErrorReport },
    /// A delta was accepted by the remote store
    DeltaConfirmed { item_id: ItemId, operation: Operation },
    /// A delta gave up after exhausting its retries
    DeltaStalled { item_id: ItemId, report: SyncErrorReport },
    /// A delta was rejected permanently; the user should be told
    DeltaRejected { item_id: ItemId, report: SyncErrorReport },
    /// A newer remote snapshot was reconciled into the local set
    RemoteSnapshotApplied { version: u64, count: usize },
}

impl SyncEvent {
    /// Whether the UI should show this event to the user
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            SyncEvent::DeltaRejected { .. } | SyncEvent::DeltaStalled { .. }
        )
    }
}
