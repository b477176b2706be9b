//! Shared Error Types
//!
//! Errors raised by the favorites sync core and by its collaborators.
//!
//! # Error Categories
//!
//! - `SyncError` - remote store, session and timeout failures
//! - `CacheError` - local persistence failures
//!
//! Every `SyncError` has a [`RetryClass`] that decides whether a failed push
//! is requeued, dropped with a user-visible signal, or discarded silently.
//!
//! # Usage
//!
//! ```rust
//! use ardelyoum::shared::error::{RetryClass, SyncError};
//!
//! let error = SyncError::network("connection reset");
//! assert_eq!(error.retry_class(), RetryClass::Retryable);
//! ```
use crate::shared::favorites::ItemId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// How a failed operation must be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Transient; requeue with backoff
    Retryable,
    /// Retrying cannot succeed; drop and surface to the user
    Permanent,
    /// Expected guard condition; drop without surfacing
    Ignored,
}

/// Errors produced by the sync core
#[derive(Debug, Error, Clone)]
pub enum SyncError {
    /// The user has no favorites document yet
    #[error("favorites document not found")]
    NotFound,

    /// Transport failure talking to the remote store
    #[error("network error: {0}")]
    Network(String),

    /// The remote store rejected the mutation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Work captured under a previous session reached the current one
    #[error("session mismatch")]
    SessionMismatch,

    /// The remote call did not resolve within the configured bound
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A toggle was requested while no user is signed in
    #[error("no active user session")]
    NoActiveSession,

    /// The store does not provide the requested capability
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Local persistence failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl SyncError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a permission error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network(_) | Self::Timeout(_) => RetryClass::Retryable,
            Self::PermissionDenied(_) | Self::Unsupported(_) | Self::Cache(_) => {
                RetryClass::Permanent
            }
            Self::NotFound | Self::NoActiveSession => RetryClass::Permanent,
            Self::SessionMismatch => RetryClass::Ignored,
        }
    }

    /// Stable kind used in reports and events
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            Self::NotFound => SyncErrorKind::NotFound,
            Self::Network(_) => SyncErrorKind::Network,
            Self::PermissionDenied(_) => SyncErrorKind::PermissionDenied,
            Self::SessionMismatch => SyncErrorKind::SessionMismatch,
            Self::Timeout(_) => SyncErrorKind::Timeout,
            Self::NoActiveSession => SyncErrorKind::NoActiveSession,
            Self::Unsupported(_) => SyncErrorKind::Unsupported,
            Self::Cache(_) => SyncErrorKind::Cache,
        }
    }
}

/// Errors from the local favorites cache
#[derive(Debug, Error, Clone)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(String),
    #[error("corrupt cache file: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    NotFound,
    Network,
    PermissionDenied,
    SessionMismatch,
    Timeout,
    NoActiveSession,
    Unsupported,
    Cache,
}

/// Sync failure as exposed to the UI through `last_sync_error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncErrorReport {
    /// Error kind
    pub kind: SyncErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Item whose push failed, absent for pull failures
    pub item_id: Option<ItemId>,
    /// When the failure was recorded
    pub at: chrono::DateTime<chrono::Utc>,
}

impl SyncErrorReport {
    pub fn new(error: &SyncError, item_id: Option<ItemId>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            item_id,
            at: chrono::Utc::now(),
        }
    }
}
