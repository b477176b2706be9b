//! Shared Module
//!
//! Types shared by the local state, the sync coordinator and the remote
//! store adapters. Everything here is plain data plus error and
//! configuration types; no module in `shared` performs I/O except the
//! configuration loaders.

/// Identifiers and the favorites set
pub mod favorites;

/// Sync events broadcast to listeners
pub mod event;

/// Shared error types
pub mod error;

/// Sync configuration
pub mod config;

/// Signed-in user identity
pub mod session;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, SyncConfig, SyncConfigBuilder};
pub use error::{CacheError, RetryClass, SyncError, SyncErrorKind, SyncErrorReport};
pub use event::SyncEvent;
pub use favorites::{FavoriteSet, ItemId, Operation, UserId};
pub use session::{Role, UserSession};
