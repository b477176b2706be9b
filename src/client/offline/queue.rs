//! # Delta Queue
//!
//! Pending favorites mutations for one user session, coalesced per item.
//!
//! ## Features
//!
//! - **Coalescing**: one entry per item; a newer toggle supersedes the unsent
//!   one and a toggle that returns to the remote state drops the entry
//! - **Single Flight**: at most one dispatched delta per item; toggles that
//!   arrive meanwhile are held until it completes
//! - **Status Tracking**: pending, in flight, retrying and stalled entries
//! - **Session Scope**: every delta carries the user and session generation
//!   it was captured under
//!
//! Each entry tracks the membership the remote is believed to hold for the
//! item (`baseline`, unknown after a timeout or a restored restart) and the
//! membership the user wants (`desired`). Only `desired` is ever sent.
//!
//! ## Usage
//!
//! ```rust
//! use ardelyoum::client::offline::queue::{DeltaQueue, EnqueueOutcome};
//! use ardelyoum::shared::{ItemId, UserId};
//! use tokio::time::Instant;
//!
//! let mut queue = DeltaQueue::new(UserId::from("u1"), 1);
//! let offer = ItemId::from("offerX");
//!
//! assert_eq!(queue.record_toggle(&offer, true), EnqueueOutcome::Queued);
//! assert_eq!(queue.record_toggle(&offer, false), EnqueueOutcome::Cancelled);
//! assert!(queue.take_ready(Instant::now()).is_empty());
//! ```

use crate::client::offline::retry::RetryPolicy;
use crate::shared::error::{RetryClass, SyncError};
use crate::shared::favorites::{FavoriteSet, ItemId, Operation, UserId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::time::Instant;
use uuid::Uuid;

/// A single dispatched change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDelta {
    /// Entry id, stable across retries of the same intent
    pub id: Uuid,
    /// User the delta was captured under
    pub user_id: UserId,
    /// Session generation the delta was captured under
    pub generation: u64,
    pub item_id: ItemId,
    pub operation: Operation,
    /// 1-based attempt number of this dispatch
    pub attempt: u32,
}

/// Entry execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaStatus {
    /// Waiting to be dispatched
    Pending,
    /// Dispatched, awaiting the remote
    InFlight,
    /// Failed transiently, waiting for its backoff
    Retrying,
    /// Retry cap reached; waits for an explicit retry
    Stalled,
}

/// Queued intent for one item
#[derive(Debug, Clone)]
pub struct QueuedDelta {
    pub id: Uuid,
    pub item_id: ItemId,
    /// Membership the user wants
    pub desired: bool,
    /// Membership the remote is believed to hold; `None` when unknown
    pub baseline: Option<bool>,
    /// Operation currently on the wire
    pub in_flight: Option<Operation>,
    pub status: DeltaStatus,
    /// Failed attempts for the current intent
    pub attempts: u32,
    pub queued_at: chrono::DateTime<chrono::Utc>,
    pub next_attempt_at: Option<Instant>,
    pub last_error: Option<String>,
}

impl QueuedDelta {
    fn new(item_id: ItemId, desired: bool, baseline: Option<bool>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            desired,
            baseline,
            in_flight: None,
            status: DeltaStatus::Pending,
            attempts: 0,
            queued_at: chrono::Utc::now(),
            next_attempt_at: None,
            last_error: None,
        }
    }

    /// Remote already holds what the user wants
    fn is_settled(&self) -> bool {
        self.in_flight.is_none() && self.baseline == Some(self.desired)
    }

    fn is_ready(&self, now: Instant) -> bool {
        match self.status {
            DeltaStatus::Pending => true,
            DeltaStatus::Retrying => self.next_attempt_at.map_or(true, |at| at <= now),
            DeltaStatus::InFlight | DeltaStatus::Stalled => false,
        }
    }

    /// Start over as a fresh intent
    fn rearm(&mut self) {
        self.status = DeltaStatus::Pending;
        self.attempts = 0;
        self.next_attempt_at = None;
        self.last_error = None;
    }
}

/// Result of recording a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// New entry created
    Queued,
    /// Unsent entry now carries the newer intent
    Superseded,
    /// Toggle returned the item to its remote state; entry dropped
    Cancelled,
    /// Item is in flight; the newer intent is sent after it completes
    Deferred,
}

/// Result of a completed dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Remote confirmed; nothing left for the item
    Retired,
    /// Remote confirmed but a newer intent is queued
    Requeued,
    /// Transient failure; retry after the backoff
    Retrying { attempt: u32 },
    /// Transient failure and the retry cap is reached
    Stalled,
    /// Permanent failure; entry dropped
    Rejected,
    /// Failure no longer matters, the user toggled back meanwhile
    Resolved,
    /// Failure, but a newer intent is queued and goes out next
    Replaced,
    /// The delta belongs to another session or entry
    Stale,
}

/// Restorable unsent change, persisted with the favorites cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub item_id: ItemId,
    pub desired: bool,
}

/// Delta queue for one user session
#[derive(Debug)]
pub struct DeltaQueue {
    user_id: UserId,
    generation: u64,
    /// Whether local membership outside the queue mirrors the remote
    remote_known: bool,
    entries: VecDeque<QueuedDelta>,
}

impl DeltaQueue {
    pub fn new(user_id: UserId, generation: u64) -> Self {
        Self {
            user_id,
            generation,
            remote_known: true,
            entries: VecDeque::new(),
        }
    }

    /// Mark whether the last pull succeeded
    ///
    /// While the remote is unknown, new entries get an unknown baseline and
    /// are always sent.
    pub fn set_remote_known(&mut self, known: bool) {
        self.remote_known = known;
    }

    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.entries.iter().position(|e| &e.item_id == item_id)
    }

    /// Record that `item_id` now has local membership `member`
    pub fn record_toggle(&mut self, item_id: &ItemId, member: bool) -> EnqueueOutcome {
        let Some(pos) = self.position(item_id) else {
            let baseline = self.remote_known.then_some(!member);
            self.entries
                .push_back(QueuedDelta::new(item_id.clone(), member, baseline));
            return EnqueueOutcome::Queued;
        };

        let entry = &mut self.entries[pos];
        entry.desired = member;
        if entry.in_flight.is_some() {
            return EnqueueOutcome::Deferred;
        }
        if entry.is_settled() {
            self.entries.remove(pos);
            return EnqueueOutcome::Cancelled;
        }
        entry.rearm();
        EnqueueOutcome::Superseded
    }

    /// Re-queue an unsent change restored from the cache
    pub fn restore(&mut self, change: PendingChange) {
        match self.position(&change.item_id) {
            Some(pos) => {
                let entry = &mut self.entries[pos];
                entry.desired = change.desired;
                entry.baseline = None;
            }
            None => self
                .entries
                .push_back(QueuedDelta::new(change.item_id, change.desired, None)),
        }
    }

    /// Dispatch every ready entry, marking it in flight
    pub fn take_ready(&mut self, now: Instant) -> Vec<SyncDelta> {
        let mut ready = Vec::new();
        for entry in self.entries.iter_mut() {
            if !entry.is_ready(now) {
                continue;
            }
            let operation = Operation::for_membership(entry.desired);
            entry.in_flight = Some(operation);
            entry.status = DeltaStatus::InFlight;
            entry.next_attempt_at = None;
            ready.push(SyncDelta {
                id: entry.id,
                user_id: self.user_id.clone(),
                generation: self.generation,
                item_id: entry.item_id.clone(),
                operation,
                attempt: entry.attempts + 1,
            });
        }
        ready
    }

    /// Whether `delta` is the dispatch its entry is waiting on
    pub fn is_in_flight(&self, delta: &SyncDelta) -> bool {
        self.in_flight_position(delta).is_some()
    }

    fn in_flight_position(&self, delta: &SyncDelta) -> Option<usize> {
        if delta.generation != self.generation || delta.user_id != self.user_id {
            return None;
        }
        self.entries
            .iter()
            .position(|e| e.id == delta.id && e.in_flight == Some(delta.operation))
    }

    /// Apply the remote's acceptance of `delta`
    pub fn complete_success(&mut self, delta: &SyncDelta) -> CompletionOutcome {
        let Some(pos) = self.in_flight_position(delta) else {
            return CompletionOutcome::Stale;
        };
        let entry = &mut self.entries[pos];
        entry.in_flight = None;
        entry.baseline = Some(delta.operation.membership());
        if entry.is_settled() {
            self.entries.remove(pos);
            return CompletionOutcome::Retired;
        }
        entry.rearm();
        CompletionOutcome::Requeued
    }

    /// Apply a failed dispatch of `delta`
    pub fn complete_failure(
        &mut self,
        delta: &SyncDelta,
        error: &SyncError,
        policy: &RetryPolicy,
        now: Instant,
    ) -> CompletionOutcome {
        let Some(pos) = self.in_flight_position(delta) else {
            return CompletionOutcome::Stale;
        };

        match error.retry_class() {
            RetryClass::Ignored => {
                self.entries.remove(pos);
                CompletionOutcome::Stale
            }
            RetryClass::Permanent => {
                self.entries.remove(pos);
                CompletionOutcome::Rejected
            }
            RetryClass::Retryable => {
                let entry = &mut self.entries[pos];
                entry.in_flight = None;
                if matches!(error, SyncError::Timeout(_)) {
                    entry.baseline = None;
                }
                if entry.is_settled() {
                    self.entries.remove(pos);
                    return CompletionOutcome::Resolved;
                }

                // A toggle received while in flight is a new intent
                if entry.desired != delta.operation.membership() {
                    entry.rearm();
                    return CompletionOutcome::Replaced;
                }

                entry.attempts += 1;
                entry.last_error = Some(error.to_string());
                if policy.should_retry(entry.attempts) {
                    entry.status = DeltaStatus::Retrying;
                    entry.next_attempt_at = Some(now + policy.delay_for(entry.attempts));
                    CompletionOutcome::Retrying {
                        attempt: entry.attempts,
                    }
                } else {
                    entry.status = DeltaStatus::Stalled;
                    entry.next_attempt_at = None;
                    CompletionOutcome::Stalled
                }
            }
        }
    }

    /// Align baselines with a fresh remote set
    ///
    /// Entries the remote already satisfies are dropped. In-flight entries are
    /// left alone; their completion updates the baseline.
    pub fn observe_remote(&mut self, remote: &FavoriteSet) -> usize {
        let before = self.entries.len();
        for entry in self.entries.iter_mut().filter(|e| e.in_flight.is_none()) {
            entry.baseline = Some(remote.contains(&entry.item_id));
        }
        self.entries.retain(|e| !e.is_settled());
        before - self.entries.len()
    }

    /// Apply every queued intent on top of `set`
    pub fn overlay(&self, set: &mut FavoriteSet) {
        for entry in &self.entries {
            set.set_membership(&entry.item_id, entry.desired);
        }
    }

    /// Re-arm stalled entries; returns how many
    pub fn rearm_stalled(&mut self) -> usize {
        let mut count = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.status == DeltaStatus::Stalled)
        {
            entry.rearm();
            count += 1;
        }
        count
    }

    /// Earliest pending retry deadline
    pub fn next_retry_at(&self) -> Option<Instant> {
        self.entries
            .iter()
            .filter(|e| e.status == DeltaStatus::Retrying)
            .filter_map(|e| e.next_attempt_at)
            .min()
    }

    pub fn has_ready(&self, now: Instant) -> bool {
        self.entries.iter().any(|e| e.is_ready(now))
    }

    /// Unsent intents, for persistence
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.entries
            .iter()
            .map(|e| PendingChange {
                item_id: e.item_id.clone(),
                desired: e.desired,
            })
            .collect()
    }

    /// Drop everything; returns how many entries were abandoned
    pub fn abandon(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: self.entries.len(),
            ..QueueStats::default()
        };
        for entry in &self.entries {
            match entry.status {
                DeltaStatus::Pending => stats.pending += 1,
                DeltaStatus::InFlight => stats.in_flight += 1,
                DeltaStatus::Retrying => stats.retrying += 1,
                DeltaStatus::Stalled => stats.stalled += 1,
            }
        }
        stats
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub retrying: usize,
    pub stalled: usize,
}
