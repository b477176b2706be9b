//! # Offline Favorites System
//!
//! Keeps favorites usable while the remote store is slow or unreachable.
//!
//! ## Key Components
//!
//! - `queue.rs`: coalescing delta queue, one intent per item
//! - `retry.rs`: retry policy with capped exponential backoff
//! - `reconciliation.rs`: versioned snapshot merge with pending intents
//!
//! These types hold no locks and perform no I/O; the sync coordinator owns
//! them and drives them from its tasks.

pub mod queue;
pub mod reconciliation;
pub mod retry;

pub use queue::{
    CompletionOutcome, DeltaQueue, DeltaStatus, EnqueueOutcome, PendingChange, QueueStats,
    QueuedDelta, SyncDelta,
};
pub use reconciliation::{ReconciliationResult, Reconciler};
pub use retry::RetryPolicy;
