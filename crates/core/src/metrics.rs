//! Prometheus metrics for the director.
//!
//! Register them with `all_metrics()`; nothing here starts an exporter.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Director - Tick Metrics
// =============================================================================

/// Ticks processed by any director.
pub static TICKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omtools_director_ticks_total", "Total director ticks"),
        &["result"], // "assigned", "empty"
    )
    .unwrap()
});

/// Matches received from fetch streams.
pub static MATCHES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "omtools_matches_fetched_total",
        "Total matches received from the backend",
    )
    .unwrap()
});

/// Assignment groups accepted by the backend.
pub static ASSIGNMENT_GROUPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "omtools_assignment_groups_total",
        "Total assignment groups sent to the backend",
    )
    .unwrap()
});

/// Tickets the backend reported as not assignable.
pub static ASSIGNMENT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "omtools_assignment_failures_total",
        "Total tickets the backend failed to assign",
    )
    .unwrap()
});

// =============================================================================
// Retry Metrics
// =============================================================================

/// Retries scheduled, by operation.
pub static RETRY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omtools_retry_attempts_total", "Total retry attempts"),
        &["operation"], // "fetch_matches", "assign_tickets"
    )
    .unwrap()
});

/// Errors that stopped a director, by operation.
pub static FATAL_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "omtools_director_fatal_errors_total",
            "Total errors that stopped a director",
        ),
        &["operation"],
    )
    .unwrap()
});

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKS.clone()),
        Box::new(MATCHES_FETCHED.clone()),
        Box::new(ASSIGNMENT_GROUPS.clone()),
        Box::new(ASSIGNMENT_FAILURES.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(FATAL_ERRORS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        RETRY_ATTEMPTS.with_label_values(&["fetch_matches"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "omtools_retry_attempts_total"));
    }
}
