//! # Local Favorites Cache
//!
//! Persists the favorites set and its unsent changes for the signed-in user,
//! so favorites render immediately on the next launch and pushes that never
//! reached the remote are retried after a restart.
//!
//! The cache holds at most one user's data. A cache written for another user
//! is never used; it is overwritten on that user's next change.
//!
//! ## Key Components
//!
//! - `FavoritesCache`: storage abstraction
//! - `JsonFileCache`: single JSON file, written atomically via rename
//! - `MemoryCache`: in-process cache for tests

use crate::client::offline::queue::PendingChange;
use crate::shared::error::CacheError;
use crate::shared::favorites::{FavoriteSet, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Persisted favorites for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFavorites {
    pub user_id: UserId,
    pub ids: FavoriteSet,
    #[serde(default)]
    pub pending: Vec<PendingChange>,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

impl CachedFavorites {
    pub fn new(user_id: UserId, ids: FavoriteSet, pending: Vec<PendingChange>) -> Self {
        Self {
            user_id,
            ids,
            pending,
            saved_at: chrono::Utc::now(),
        }
    }
}

/// Storage for [`CachedFavorites`]
///
/// Called outside the coordinator lock; implementations must not block the
/// runtime thread.
#[async_trait]
pub trait FavoritesCache: Send + Sync {
    async fn load(&self) -> Result<Option<CachedFavorites>>;

    async fn store(&self, favorites: &CachedFavorites) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Cached favorites if they belong to `user_id`
    async fn load_for(&self, user_id: &UserId) -> Result<Option<CachedFavorites>> {
        Ok(self.load().await?.filter(|cached| &cached.user_id == user_id))
    }
}

/// Cache stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform data directory, falling back to the temp dir
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("ardelyoum");
        path.push("favorites.json");
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FavoritesCache for JsonFileCache {
    async fn load(&self) -> Result<Option<CachedFavorites>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn store(&self, favorites: &CachedFavorites) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(favorites)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<CachedFavorites>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(favorites: CachedFavorites) -> Self {
        Self {
            slot: Mutex::new(Some(favorites)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CachedFavorites>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FavoritesCache for MemoryCache {
    async fn load(&self) -> Result<Option<CachedFavorites>> {
        Ok(self.slot().clone())
    }

    async fn store(&self, favorites: &CachedFavorites) -> Result<()> {
        *self.slot() = Some(favorites.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
