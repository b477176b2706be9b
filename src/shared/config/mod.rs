//! Sync configuration module
//!
//! Provides configuration types for the favorites sync core. Values can be
//! built in code, read from `ARDELYOUM_*` environment variables, or loaded
//! from a TOML file whose keys mirror the variables (durations in ms):
//!
//! ```toml
//! flush_timeout_ms = 8000
//! retry_base_delay_ms = 500
//! retry_max_delay_ms = 8000
//! retry_max_attempts = 3
//! flush_debounce_ms = 250
//! auto_flush = true
//! realtime = false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(8);
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_JITTER: f64 = 0.1;
const DEFAULT_FLUSH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Configuration for the sync coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Bound on a single remote mutation
    pub flush_timeout: Duration,
    /// First retry delay
    pub retry_base_delay: Duration,
    /// Ceiling for the doubled retry delay
    pub retry_max_delay: Duration,
    /// Attempts before a delta is parked as stalled
    pub retry_max_attempts: u32,
    /// Jitter factor applied to each retry delay (0.0 to 1.0)
    pub retry_jitter: f64,
    /// Quiet window before the worker dispatches, lets re-toggles coalesce
    pub flush_debounce: Duration,
    /// Spawn a background flush worker per session
    pub auto_flush: bool,
    /// Subscribe to real-time remote snapshots per session
    pub realtime: bool,
    /// Location of the persisted favorites cache
    pub cache_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_jitter: DEFAULT_RETRY_JITTER,
            flush_debounce: DEFAULT_FLUSH_DEBOUNCE,
            auto_flush: true,
            realtime: false,
            cache_path: None,
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfigBuilder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "flush_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry_max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retry_base_delay > self.retry_max_delay {
            return Err(ConfigError::InvalidValue {
                key: "retry_base_delay",
                reason: "must not exceed retry_max_delay".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.retry_jitter) {
            return Err(ConfigError::InvalidValue {
                key: "retry_jitter",
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from `ARDELYOUM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = ConfigFile {
            flush_timeout_ms: parse_var(&lookup, "ARDELYOUM_FLUSH_TIMEOUT_MS")?,
            retry_base_delay_ms: parse_var(&lookup, "ARDELYOUM_RETRY_BASE_DELAY_MS")?,
            retry_max_delay_ms: parse_var(&lookup, "ARDELYOUM_RETRY_MAX_DELAY_MS")?,
            retry_max_attempts: parse_var(&lookup, "ARDELYOUM_RETRY_MAX_ATTEMPTS")?,
            retry_jitter: parse_var(&lookup, "ARDELYOUM_RETRY_JITTER")?,
            flush_debounce_ms: parse_var(&lookup, "ARDELYOUM_FLUSH_DEBOUNCE_MS")?,
            auto_flush: parse_var(&lookup, "ARDELYOUM_AUTO_FLUSH")?,
            realtime: parse_var(&lookup, "ARDELYOUM_REALTIME")?,
            cache_path: lookup("ARDELYOUM_CACHE_PATH").map(PathBuf::from),
        };
        file.into_builder().build()
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.into_builder().build()
    }
}

/// Builder for SyncConfig
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: Option<SyncConfig>,
}

impl SyncConfigBuilder {
    fn config(&mut self) -> &mut SyncConfig {
        self.config.get_or_insert_with(SyncConfig::default)
    }

    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config().flush_timeout = timeout;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config().retry_base_delay = delay;
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config().retry_max_delay = delay;
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config().retry_max_attempts = attempts;
        self
    }

    pub fn retry_jitter(mut self, jitter: f64) -> Self {
        self.config().retry_jitter = jitter;
        self
    }

    pub fn flush_debounce(mut self, debounce: Duration) -> Self {
        self.config().flush_debounce = debounce;
        self
    }

    pub fn auto_flush(mut self, enabled: bool) -> Self {
        self.config().auto_flush = enabled;
        self
    }

    pub fn realtime(mut self, enabled: bool) -> Self {
        self.config().realtime = enabled;
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config().cache_path = Some(path.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(mut self) -> Result<SyncConfig, ConfigError> {
        let config = self.config.take().unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

/// On-disk and environment shape of the configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    flush_timeout_ms: Option<u64>,
    retry_base_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    retry_max_attempts: Option<u32>,
    retry_jitter: Option<f64>,
    flush_debounce_ms: Option<u64>,
    auto_flush: Option<bool>,
    realtime: Option<bool>,
    cache_path: Option<PathBuf>,
}

impl ConfigFile {
    fn into_builder(self) -> SyncConfigBuilder {
        let mut builder = SyncConfig::builder();
        if let Some(ms) = self.flush_timeout_ms {
            builder = builder.flush_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.retry_base_delay_ms {
            builder = builder.retry_base_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.retry_max_delay_ms {
            builder = builder.retry_max_delay(Duration::from_millis(ms));
        }
        if let Some(attempts) = self.retry_max_attempts {
            builder = builder.retry_max_attempts(attempts);
        }
        if let Some(jitter) = self.retry_jitter {
            builder = builder.retry_jitter(jitter);
        }
        if let Some(ms) = self.flush_debounce_ms {
            builder = builder.flush_debounce(Duration::from_millis(ms));
        }
        if let Some(enabled) = self.auto_flush {
            builder = builder.auto_flush(enabled);
        }
        if let Some(enabled) = self.realtime {
            builder = builder.realtime(enabled);
        }
        if let Some(path) = self.cache_path {
            builder = builder.cache_path(path);
        }
        builder
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key,
                reason: format!("cannot parse {raw:?}"),
            }),
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("failed to read {path:?}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
}
