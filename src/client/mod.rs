//! Favorites Client Module
//!
//! Client-side favorites: the optimistic local set, the offline delta queue,
//! the remote store seam and the session-scoped sync coordinator that ties
//! them together.
//!
//! # Architecture
//!
//! - **`favorites`** - Local favorites state observed by screens
//! - **`offline`** - Delta queue, retry policy, snapshot reconciliation
//! - **`remote`** - Remote store trait and the in-memory store
//! - **`local_cache`** - Favorites persisted across restarts
//! - **`session`** - Login/logout broadcast hub
//! - **`sync`** - Sync coordinator, health and background tasks
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── favorites.rs    - Local favorites state
//! ├── local_cache.rs  - Favorites cache
//! ├── session.rs      - Session hub
//! ├── offline/        - Queue, retry, reconciliation
//! ├── remote/         - Remote store trait and in-memory store
//! └── sync/           - Coordinator, health, metrics, background tasks
//! ```

pub mod favorites;
pub mod local_cache;
pub mod offline;
pub mod remote;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use favorites::{FavoritesView, LocalFavoritesState};
pub use local_cache::{CachedFavorites, FavoritesCache, JsonFileCache, MemoryCache};
pub use remote::{FavoritesWatch, InMemoryRemoteStore, RemoteFavoritesStore, RemoteSnapshot};
pub use session::{SessionEvent, SessionHub};
pub use sync::{
    FlushReport, PullOutcome, SessionListener, SyncCoordinator, SyncHealth, SyncMetrics,
    SyncStatus,
};
