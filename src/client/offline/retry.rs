//! # Retry Policy
//!
//! Decides how long a failed favorites push waits before its next attempt,
//! and when it stops trying.
//!
//! ## Features
//!
//! - **Exponential Backoff**: delay doubles per attempt up to a ceiling
//! - **Jitter**: bounded randomness so devices do not retry in lockstep
//! - **Max Attempts**: after the cap a delta is parked as stalled
//!
//! ## Usage
//!
//! ```rust
//! use ardelyoum::client::offline::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::exponential(Duration::from_millis(500), Duration::from_secs(4), 3);
//! assert_eq!(policy.base_delay(1), Duration::from_millis(500));
//! assert_eq!(policy.base_delay(2), Duration::from_secs(1));
//! assert!(policy.should_retry(2));
//! assert!(!policy.should_retry(3));
//! ```

use crate::shared::config::SyncConfig;
use rand::Rng;
use std::time::Duration;

/// Retry policy for failed pushes
///
/// The delay doubles from `base` per attempt and is capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base: Duration,
    max: Duration,
    /// Total attempts allowed, the first one included
    max_attempts: u32,
    /// Jitter factor (0.0 to 1.0)
    jitter: f64,
}

impl RetryPolicy {
    pub fn exponential(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
            jitter: 0.0,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::exponential(
            config.retry_base_delay,
            config.retry_max_delay,
            config.retry_max_attempts,
        )
        .with_jitter(config.retry_jitter)
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Whether another attempt is allowed after `attempts` have failed
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent).min(self.max)
    }

    /// Delay before retry number `attempt`, jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt);
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let spread = delay.mul_f64(self.jitter);
        let extra = rand::thread_rng().gen_range(Duration::ZERO..=spread);
        delay + extra
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
