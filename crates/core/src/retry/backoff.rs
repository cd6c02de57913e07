//! Capped, jittered exponential backoff.

use std::time::Duration;

use rand::Rng;

use super::config::RetryConfig;

/// Delay schedule for one retry sequence.
///
/// Delay `n` is `initial * 2^n`, jittered by +/- `jitter_percent`, then capped
/// at `max_backoff`. The iterator ends after `max_retries` delays. Build a new
/// one for every retried call; it is never shared.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    jitter_percent: u64,
    max_retries: u32,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            initial: config.initial_backoff(),
            max: config.max_backoff(),
            jitter_percent: config.jitter_percent,
            max_retries: config.max_retries,
            attempt: 0,
        }
    }

    /// Number of delays handed out so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether the sequence has no delays left.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_retries
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let base = exponential(self.initial, self.attempt);
        self.attempt += 1;
        Some(apply_jitter(base, self.jitter_percent).min(self.max))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.max_retries.saturating_sub(self.attempt) as usize;
        (remaining, Some(remaining))
    }
}

fn exponential(initial: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    initial.saturating_mul(factor)
}

/// Spread `delay` uniformly over `[delay - p%, delay + p%]`.
fn apply_jitter(delay: Duration, percent: u64) -> Duration {
    if percent == 0 || delay.is_zero() {
        return delay;
    }
    let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
    let spread = (u128::from(nanos) * u128::from(percent) / 100) as u64;
    let offset = rand::rng().random_range(0..=spread.saturating_mul(2));
    Duration::from_nanos(nanos.saturating_sub(spread).saturating_add(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RetryConfig {
        RetryConfig {
            jitter_percent: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_doubles_from_initial() {
        let delays: Vec<_> = Backoff::new(&no_jitter()).take(4).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1600),
            ]
        );
    }

    #[test]
    fn test_capped_at_max() {
        let delays: Vec<_> = Backoff::new(&no_jitter()).collect();
        assert_eq!(delays.len(), 10);
        // 200ms * 2^6 = 12.8s exceeds the cap
        assert_eq!(delays[5], Duration::from_millis(6400));
        assert!(delays[6..].iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[test]
    fn test_never_more_than_max_retries() {
        let mut backoff = Backoff::new(&RetryConfig::default());
        assert_eq!(backoff.size_hint(), (10, Some(10)));
        let count = backoff.by_ref().count();
        assert_eq!(count, 10);
        assert!(backoff.is_exhausted());
        assert!(backoff.next().is_none());
    }

    #[test]
    fn test_jitter_stays_in_bounds_and_under_cap() {
        for _ in 0..200 {
            for (n, delay) in Backoff::new(&RetryConfig::default()).enumerate() {
                assert!(delay <= Duration::from_secs(10));
                let base = 200.0 * 2f64.powi(n as i32);
                let lower = (base * 0.95).min(10_000.0);
                let ms = delay.as_secs_f64() * 1000.0;
                assert!(ms >= lower - 0.001, "delay {ms}ms below bound of {lower}ms");
            }
        }
    }

    #[test]
    fn test_zero_retries_yields_nothing() {
        let config = RetryConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(Backoff::new(&config).count(), 0);
    }

    #[test]
    fn test_exponential_saturates() {
        assert_eq!(
            exponential(Duration::from_millis(200), 40),
            Duration::from_millis(200).saturating_mul(u32::MAX)
        );
    }
}
