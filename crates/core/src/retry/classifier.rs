//! Transient vs fatal error classification.
//!
//! Backend components report a temporary outage as `Unavailable`. A match
//! function that is down surfaces differently: its `Unavailable` status is
//! rendered into the message of an outer `Unknown` status, so the code alone
//! is not enough and the status text is inspected as well.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::backend::{Code, Status};

/// Status text of an `Unavailable` failure as the backend renders it.
pub const DEFAULT_UNAVAILABLE_MARKER: &str = "rpc error: code = Unavailable";

/// Bound on how many `source()` layers are inspected.
const MAX_UNWRAP_DEPTH: usize = 32;

/// Find the first `Status` in an error's source chain.
pub fn as_status<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Status> {
    let mut current = Some(err);
    for _ in 0..MAX_UNWRAP_DEPTH {
        let layer = current?;
        if let Some(status) = layer.downcast_ref::<Status>() {
            return Some(status);
        }
        current = layer.source();
    }
    None
}

/// Whether the error chain carries a status with the given code.
pub fn has_status_code(err: &(dyn Error + 'static), code: Code) -> bool {
    as_status(err).is_some_and(|status| status.code() == code)
}

/// Classify with the default marker.
pub fn is_retryable(err: &(dyn Error + 'static)) -> bool {
    as_status(err).is_some_and(|status| {
        status.code() == Code::Unavailable
            || status.to_string().contains(DEFAULT_UNAVAILABLE_MARKER)
    })
}

type StatusPredicate = Arc<dyn Fn(&Status) -> bool + Send + Sync>;

/// Decides whether a failure is worth retrying.
///
/// A status with code `Unavailable` is always retryable. The check for an
/// `Unavailable` embedded inside another status is a replaceable predicate,
/// since it depends on the backend's error formatting.
#[derive(Clone)]
pub struct ErrorClassifier {
    embedded_unavailable: StatusPredicate,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_UNAVAILABLE_MARKER)
    }

    /// Treat any status whose text contains `marker` as retryable.
    ///
    /// A blank marker disables the embedded check; only `Unavailable` itself
    /// is then retried.
    pub fn with_marker(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        if marker.trim().is_empty() {
            return Self::with_predicate(|_: &Status| false);
        }
        Self::with_predicate(move |status: &Status| status.to_string().contains(&marker))
    }

    /// Use a custom check for wrapped `Unavailable` failures.
    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Status) -> bool + Send + Sync + 'static,
    {
        Self {
            embedded_unavailable: Arc::new(predicate),
        }
    }

    pub fn is_retryable_status(&self, status: &Status) -> bool {
        status.code() == Code::Unavailable || (self.embedded_unavailable)(status)
    }

    /// Errors without a status anywhere in their chain are fatal.
    pub fn is_retryable(&self, err: &(dyn Error + 'static)) -> bool {
        as_status(err).is_some_and(|status| self.is_retryable_status(status))
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("embedded_unavailable", &"<predicate>")
            .finish()
    }
}
