//! Ardelyoum - Favorites Sync Library
//!
//! Keeps a signed-in user's favorite offers in sync between the app and the
//! backend document store. Toggles apply to the local set immediately and
//! reach the remote in the background, coalesced per item and retried with
//! bounded exponential backoff. Everything is scoped to one user session;
//! work that belongs to a previous session is discarded, never applied.
//!
//! # Module Structure
//!
//! - **`shared`** - Identifiers, favorites set, errors, events, config
//!   - Plain data types shared by every layer
//!   - `SyncConfig` loaders for env and TOML
//!
//! - **`client`** - Local state and the sync coordinator
//!   - `LocalFavoritesState` observed by screens
//!   - `DeltaQueue`, `RetryPolicy` and `Reconciler`
//!   - `RemoteFavoritesStore` seam and `InMemoryRemoteStore`
//!   - `SyncCoordinator`, `SessionHub` and the favorites cache
//!
//! # Usage
//!
//! ```rust,no_run
//! use ardelyoum::client::{InMemoryRemoteStore, JsonFileCache, SessionHub, SyncCoordinator};
//! use ardelyoum::shared::{ItemId, SyncConfig, UserSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_env()?;
//! let coordinator = SyncCoordinator::new(
//!     Arc::new(InMemoryRemoteStore::new()),
//!     Arc::new(JsonFileCache::new(JsonFileCache::default_path())),
//!     config,
//! );
//!
//! let hub = SessionHub::new();
//! let _listener = coordinator.attach(&hub);
//! hub.start(UserSession::new("u1"));
//!
//! coordinator.request_toggle(&ItemId::from("offerA")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `SyncCoordinator` is `Clone + Send + Sync`. Its state sits behind one
//! async mutex; observers read through `watch` and `broadcast` channels and
//! never block it.
//!
//! # Error Handling
//!
//! - `SyncError` for every sync operation, classified by `retry_class`
//! - `CacheError` for the local cache
//! - `ConfigError` for configuration loading

/// Shared types and data structures
pub mod shared;

/// Client-side favorites and sync
pub mod client;
