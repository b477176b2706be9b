//! # Sync Metrics
//!
//! Counters for pulls, pushes and the queue's coalescing and session guard.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncMetrics {
    pub pulls: u64,
    pub pull_failures: u64,
    pub pushes: u64,
    pub push_failures: u64,
    /// Toggles merged into an existing queue entry
    pub coalesced: u64,
    /// Toggles that cancelled a queued change outright
    pub cancelled: u64,
    pub retries: u64,
    pub stalled: u64,
    pub rejected: u64,
    /// Deltas dropped by the session guard
    pub dropped_stale: u64,
    pub snapshots_applied: u64,
    pub snapshots_discarded: u64,
    pub last_push_duration: Option<Duration>,
    pub average_push_duration: Duration,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push_success(&mut self, duration: Duration) {
        self.pushes = self.pushes.saturating_add(1);
        self.last_push_duration = Some(duration);

        // Rolling average over successful pushes
        let count = u128::from(self.pushes);
        let total = self.average_push_duration.as_nanos() * (count - 1) + duration.as_nanos();
        let average = u64::try_from(total / count).unwrap_or(u64::MAX);
        self.average_push_duration = Duration::from_nanos(average);
    }

    pub fn record_push_failure(&mut self) {
        self.push_failures += 1;
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.pushes + self.push_failures;
        if total == 0 {
            0.0
        } else {
            self.pushes as f64 / total as f64
        }
    }
}
