//! Director configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Configuration for a match director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// How often to fetch matches (milliseconds).
    /// A tick that overruns delays the next one; missed ticks are not queued.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    /// Backoff for fetch and assign retries.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_tick_rate() -> u64 {
    1000 // 1 second
}

impl DirectorConfig {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DirectorConfig::default();
        assert_eq!(config.tick_rate(), Duration::from_secs(1));
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            tick_rate_ms = 2000

            [retry]
            max_retries = 5
            initial_backoff_ms = 100
            max_backoff_ms = 3000
            jitter_percent = 0
        "#;
        let config: DirectorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tick_rate_ms, 2000);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.retry.max_backoff_ms, 3000);
        assert_eq!(config.retry.jitter_percent, 0);
    }
}
