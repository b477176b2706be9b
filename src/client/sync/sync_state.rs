//! # Sync Health
//!
//! Observable sync status, kept apart from the favorites themselves so a
//! failed push never changes what the favorites screen shows.

use crate::shared::error::SyncErrorReport;
use serde::Serialize;

/// Coarse sync status for banners and indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No active session
    Idle,
    /// A pull or a push is outstanding
    Syncing,
    /// Remote and local agree as far as the coordinator knows
    Synced,
    /// The last pull failed; local favorites are a cached fallback
    Degraded,
    /// Some changes exhausted their retries and wait for a manual retry
    Unsynced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncHealth {
    pub status: SyncStatus,
    /// Most recent failure; cleared by the next successful pull or push
    pub last_sync_error: Option<SyncErrorReport>,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Queued changes not yet confirmed by the remote
    pub pending: usize,
}

impl SyncHealth {
    pub fn is_healthy(&self) -> bool {
        self.last_sync_error.is_none()
            && matches!(self.status, SyncStatus::Synced | SyncStatus::Idle)
    }
}

impl Default for SyncHealth {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            last_sync_error: None,
            last_synced_at: None,
            pending: 0,
        }
    }
}
