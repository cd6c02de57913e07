//! Retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::classifier::DEFAULT_UNAVAILABLE_MARKER;

/// Backoff and classification settings shared by every retried call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds). Doubles on every retry.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Uniform jitter applied to each delay, in percent (+/-).
    #[serde(default = "default_jitter_percent")]
    pub jitter_percent: u64,

    /// Status text that marks an Unavailable failure wrapped inside another
    /// code. Depends on how the backend formats nested errors.
    #[serde(default = "default_unavailable_marker")]
    pub unavailable_marker: String,
}

fn default_max_retries() -> u32 {
    10
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    10_000 // 10 seconds
}

fn default_jitter_percent() -> u64 {
    5
}

fn default_unavailable_marker() -> String {
    DEFAULT_UNAVAILABLE_MARKER.to_string()
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            jitter_percent: default_jitter_percent(),
            unavailable_marker: default_unavailable_marker(),
        }
    }
}
