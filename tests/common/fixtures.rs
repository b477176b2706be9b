//! Coordinator fixtures
//!
//! Builds a coordinator over the in-memory remote store and an in-memory
//! cache, with jitter disabled so backoff deadlines are exact.

use ardelyoum::client::{InMemoryRemoteStore, MemoryCache, SyncCoordinator};
use ardelyoum::shared::{ItemId, SyncConfig, UserId};
use std::sync::Arc;
use std::time::Duration;

pub const BASE_DELAY: Duration = Duration::from_millis(100);
pub const MAX_DELAY: Duration = Duration::from_millis(400);
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Config with manual flushing and deterministic backoff
pub fn manual_config() -> SyncConfig {
    SyncConfig::builder()
        .auto_flush(false)
        .retry_jitter(0.0)
        .retry_base_delay(BASE_DELAY)
        .retry_max_delay(MAX_DELAY)
        .flush_timeout(FLUSH_TIMEOUT)
        .build()
        .expect("valid test config")
}

/// Config with the background worker and real-time watch enabled
pub fn background_config() -> SyncConfig {
    SyncConfig::builder()
        .retry_jitter(0.0)
        .retry_base_delay(BASE_DELAY)
        .retry_max_delay(MAX_DELAY)
        .flush_timeout(FLUSH_TIMEOUT)
        .flush_debounce(Duration::from_millis(50))
        .realtime(true)
        .build()
        .expect("valid test config")
}

pub struct Harness {
    pub store: Arc<InMemoryRemoteStore>,
    pub cache: Arc<MemoryCache>,
    pub coordinator: SyncCoordinator,
}

impl Harness {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_cache(config, MemoryCache::new())
    }

    pub fn with_cache(config: SyncConfig, cache: MemoryCache) -> Self {
        let store = Arc::new(InMemoryRemoteStore::new());
        let cache = Arc::new(cache);
        let coordinator = SyncCoordinator::new(store.clone(), cache.clone(), config);
        Self {
            store,
            cache,
            coordinator,
        }
    }

    /// A second coordinator over the same store and cache, as after a restart
    pub fn restart(&self, config: SyncConfig) -> SyncCoordinator {
        SyncCoordinator::new(self.store.clone(), self.cache.clone(), config)
    }
}

pub fn item(id: &str) -> ItemId {
    ItemId::from(id)
}

pub fn user(id: &str) -> UserId {
    UserId::from(id)
}
