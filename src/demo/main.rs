/**
 * Favorites Sync Demo
 *
 * Runs the sync coordinator against the in-memory remote store and walks
 * through the core flows: pull on login, optimistic toggles, offline retry,
 * and a logout that discards in-flight work.
 */

#[cfg(feature = "demo")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use ardelyoum::client::{
        FavoritesCache, InMemoryRemoteStore, JsonFileCache, MemoryCache, SessionHub,
        SyncCoordinator,
    };
    use ardelyoum::shared::{ItemId, SyncConfig, SyncError, SyncEvent, UserId, UserSession};
    use std::sync::Arc;
    use std::time::Duration;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = SyncConfig::from_env()?;
    tracing::info!("[STARTUP] Loaded config: {:?}", config);

    let cache: Arc<dyn FavoritesCache> = match &config.cache_path {
        Some(path) => Arc::new(JsonFileCache::new(path)),
        None => Arc::new(MemoryCache::new()),
    };

    let store = Arc::new(InMemoryRemoteStore::new());
    let alice = UserId::from("alice");
    store.seed(&alice, ["offerA", "offerB"]);

    let coordinator = SyncCoordinator::new(store.clone(), cache, config.clone());
    let hub = SessionHub::new();
    let _listener = coordinator.attach(&hub);

    // Login pulls the remote set
    let mut events = coordinator.events();
    hub.start(UserSession::new("alice").with_email("alice@example.com"));
    loop {
        match events.recv().await? {
            SyncEvent::PullCompleted { .. } | SyncEvent::PullFailed { .. } => break,
            _ => {}
        }
    }
    println!("favorites after login: {:?}", coordinator.favorites().ids.to_vec());

    // Optimistic toggle, pushed in the background
    coordinator.request_toggle(&ItemId::from("offerC")).await?;
    println!("favorites after toggle: {:?}", coordinator.favorites().ids.to_vec());
    tokio::time::sleep(config.flush_debounce + Duration::from_millis(100)).await;
    println!("remote after flush: {:?}", store.favorites(&alice).map(|ids| ids.to_vec()));

    // Offline: the push fails until retries run out
    store.fail_next_applies(config.retry_max_attempts as usize, SyncError::network("offline"));
    coordinator.request_toggle(&ItemId::from("offerB")).await?;
    let mut health = coordinator.health();
    while health.borrow().last_sync_error.is_none() {
        health.changed().await?;
    }
    tokio::time::sleep(config.retry_max_delay * config.retry_max_attempts).await;
    println!("health while offline: {:?}", *health.borrow());

    // Back online
    coordinator.retry_stalled().await;
    tokio::time::sleep(config.flush_debounce + Duration::from_millis(100)).await;
    println!("remote after retry: {:?}", store.favorites(&alice).map(|ids| ids.to_vec()));
    println!("healthy after retry: {}", coordinator.health().borrow().is_healthy());

    // Logout while a push is outstanding
    store.set_apply_latency(Duration::from_secs(1));
    coordinator.request_toggle(&ItemId::from("offerA")).await?;
    hub.end();
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("favorites after logout: {:?}", coordinator.favorites());

    let metrics = coordinator.metrics().await;
    println!("metrics: {:?}", metrics);
    println!("push success rate: {:.0}%", metrics.success_rate() * 100.0);
    coordinator.shutdown().await;
    Ok(())
}

#[cfg(not(feature = "demo"))]
fn main() {
    eprintln!("The demo requires the 'demo' feature to be enabled.");
    eprintln!("Run with: cargo run --bin favsync-demo --features demo");
    std::process::exit(1);
}
