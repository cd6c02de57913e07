//! Types for the match director.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{AssignmentGroup, Match, Status};

/// Errors an assigner can report.
#[derive(Debug, Error)]
pub enum AssignerError {
    /// A service the assigner depends on failed. Retried when transient.
    #[error("assigner backend error: {0}")]
    Backend(#[from] Status),

    /// No game server could take the matches.
    #[error("no capacity: {0}")]
    NoCapacity(String),

    #[error("assigner error: {0}")]
    Other(String),
}

/// Turns a batch of matches into assignment groups.
///
/// Called once per non-empty tick (again on a retried assign), never
/// concurrently by the same director.
#[async_trait]
pub trait Assigner: Send + Sync {
    async fn assign(&self, matches: &[Match]) -> Result<Vec<AssignmentGroup>, AssignerError>;
}

/// Errors that stop a director.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// Opening the fetch stream failed.
    #[error("failed to fetch matches: {0}")]
    Fetch(#[source] Status),

    /// The fetch stream failed part way through.
    #[error("failed to recv matches: {0}")]
    Recv(#[source] Status),

    /// The assigner could not assign the batch.
    #[error("assigner failed: {0}")]
    Assigner(#[source] AssignerError),

    /// The backend rejected the assignment groups.
    #[error("failed to assign tickets: {0}")]
    AssignTickets(#[source] Status),

    /// The cancellation token fired.
    #[error("director cancelled")]
    Cancelled,
}

impl DirectorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DirectorError::Cancelled)
    }

    /// Label used for logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            DirectorError::Fetch(_) | DirectorError::Recv(_) => "fetch_matches",
            DirectorError::Assigner(_) | DirectorError::AssignTickets(_) => "assign_tickets",
            DirectorError::Cancelled => "cancelled",
        }
    }
}

/// Where the director is in its tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorState {
    /// Waiting for the next tick.
    Idle,
    /// Fetching (or backing off between fetch attempts).
    FetchingMatches,
    /// Assigning (or backing off between assign attempts).
    AssigningMatches,
    /// Run returned; terminal.
    Stopped,
}

impl DirectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectorState::Idle => "idle",
            DirectorState::FetchingMatches => "fetching_matches",
            DirectorState::AssigningMatches => "assigning_matches",
            DirectorState::Stopped => "stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{as_status, is_retryable};
    use crate::backend::Code;

    #[test]
    fn test_error_display() {
        let err = DirectorError::Recv(Status::internal("stream reset"));
        assert_eq!(
            err.to_string(),
            "failed to recv matches: rpc error: code = Internal desc = stream reset"
        );
        assert_eq!(DirectorError::Cancelled.to_string(), "director cancelled");
    }

    #[test]
    fn test_status_reachable_through_assigner_error() {
        let err = DirectorError::Assigner(AssignerError::Backend(Status::unavailable(
            "allocator down",
        )));
        assert_eq!(as_status(&err).map(|s| s.code()), Some(Code::Unavailable));
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_assigner_without_status_is_fatal() {
        let err = DirectorError::Assigner(AssignerError::NoCapacity("fleet full".into()));
        assert!(!is_retryable(&err));
        assert!(!is_retryable(&DirectorError::Cancelled));
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(
            DirectorError::Fetch(Status::unavailable("x")).operation(),
            "fetch_matches"
        );
        assert_eq!(
            DirectorError::AssignTickets(Status::unavailable("x")).operation(),
            "assign_tickets"
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&DirectorState::FetchingMatches).unwrap();
        assert_eq!(json, "\"fetching_matches\"");
        assert_eq!(DirectorState::Stopped.as_str(), "stopped");
    }
}
