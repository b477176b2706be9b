//! Configuration from TOML files and the environment

use ardelyoum::shared::{ConfigError, SyncConfig};
use assert_matches::assert_matches;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_toml_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "flush_timeout_ms = 3000\nretry_max_attempts = 5\nrealtime = true\ncache_path = \"/tmp/favorites.json\""
    )
    .unwrap();

    let config = SyncConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.flush_timeout, Duration::from_secs(3));
    assert_eq!(config.retry_max_attempts, 5);
    assert!(config.realtime);
    assert_eq!(config.retry_base_delay, SyncConfig::default().retry_base_delay);
    assert!(config.cache_path.is_some());
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SyncConfig::from_toml_file(dir.path().join("absent.toml"));
    assert_matches!(result, Err(ConfigError::Read { .. }));
}

#[test]
fn test_env_lookup_is_validated() {
    let vars: HashMap<&str, &str> = [
        ("ARDELYOUM_RETRY_BASE_DELAY_MS", "9000"),
        ("ARDELYOUM_RETRY_MAX_DELAY_MS", "1000"),
    ]
    .into_iter()
    .collect();

    let result = SyncConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
    assert_matches!(
        result,
        Err(ConfigError::InvalidValue {
            key: "retry_base_delay",
            ..
        })
    );
}
