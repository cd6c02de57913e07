//! Bounded retries for backend calls.
//!
//! - **Classification**: only transient failures (`Unavailable`, including the
//!   wrapped form) are retried; everything else is returned at once.
//! - **Backoff**: 200ms doubling, +/-5% jitter, 10s cap, at most 10 retries.
//! - **Cancellation**: the sleep between attempts observes the token.

mod backoff;
pub mod classifier;
mod config;

pub use backoff::Backoff;
pub use classifier::{as_status, has_status_code, is_retryable, ErrorClassifier};
pub use config::RetryConfig;

use std::fmt::Display;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::metrics;

/// Why a retry sequence ended without a value.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The token was cancelled while waiting between attempts.
    Cancelled,
    /// The last error, either fatal or left over after the backoff ran out.
    Failed(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Failed(err) => Some(err),
        }
    }
}

/// Run `operation` until it succeeds, fails fatally, or `backoff` runs out.
///
/// `operation` receives the 1-based attempt number. Errors that
/// `is_retryable` rejects are returned immediately without sleeping.
pub async fn retry<T, E, F, Fut, R>(
    name: &'static str,
    mut backoff: Backoff,
    cancel: &CancellationToken,
    is_retryable: R,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt: u32 = 1;
    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(RetryError::Failed(err));
        }

        let Some(delay) = backoff.next() else {
            warn!(
                operation = name,
                attempts = attempt,
                "Retries exhausted: {}",
                err
            );
            return Err(RetryError::Failed(err));
        };

        debug!(
            operation = name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Transient failure, retrying: {}",
            err
        );
        metrics::RETRY_ATTEMPTS.with_label_values(&[name]).inc();

        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
