use super::ConfigError;
use crate::director::DirectorConfig;

/// Validate configuration
/// Currently validates:
/// - Tick rate is not 0
/// - Initial backoff is not 0 and does not exceed the cap
/// - Jitter is at most 100%
/// - Unavailable marker is not empty
pub fn validate_config(config: &DirectorConfig) -> Result<(), ConfigError> {
    if config.tick_rate_ms == 0 {
        return Err(ConfigError::ValidationError(
            "tick_rate_ms cannot be 0".to_string(),
        ));
    }

    let retry = &config.retry;
    if retry.initial_backoff_ms == 0 {
        return Err(ConfigError::ValidationError(
            "retry.initial_backoff_ms cannot be 0".to_string(),
        ));
    }
    if retry.max_backoff_ms < retry.initial_backoff_ms {
        return Err(ConfigError::ValidationError(format!(
            "retry.max_backoff_ms ({}) is below retry.initial_backoff_ms ({})",
            retry.max_backoff_ms, retry.initial_backoff_ms
        )));
    }
    if retry.jitter_percent > 100 {
        return Err(ConfigError::ValidationError(
            "retry.jitter_percent cannot exceed 100".to_string(),
        ));
    }
    if retry.unavailable_marker.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "retry.unavailable_marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&DirectorConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_tick_rate_zero_fails() {
        let config = DirectorConfig {
            tick_rate_ms: 0,
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_backoff_bounds() {
        let config = DirectorConfig {
            retry: RetryConfig {
                initial_backoff_ms: 5_000,
                max_backoff_ms: 1_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_backoff_ms"));
    }

    #[test]
    fn test_validate_jitter_over_100_fails() {
        let config = DirectorConfig {
            retry: RetryConfig {
                jitter_percent: 150,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_marker_fails() {
        let config = DirectorConfig {
            retry: RetryConfig {
                unavailable_marker: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
