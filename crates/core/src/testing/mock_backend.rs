//! Mock matchmaking backend for testing.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{
    AssignTicketsRequest, AssignTicketsResponse, Backend, FetchMatchesRequest,
    FetchMatchesResponse, Match, MatchStream, Status,
};

/// What the next fetch call should do.
#[derive(Debug, Clone)]
enum FetchOutcome {
    /// Stream these matches, then end normally.
    Matches(Vec<Match>),
    /// Stream these matches, then fail.
    Partial(Vec<Match>, Status),
    /// Fail to open the stream.
    Fail(Status),
    /// Open a stream that never yields.
    Hang,
}

/// What the next assign call should do.
#[derive(Debug, Clone)]
enum AssignOutcome {
    Respond(Result<AssignTicketsResponse, Status>),
    /// Never return.
    Hang,
}

/// Mock implementation of the Backend trait.
///
/// Fetch and assign outcomes are queued and consumed one per call. When a
/// queue is empty, fetch streams the default matches (none unless set) and
/// assign succeeds with no failures.
///
/// # Example
///
/// ```rust,ignore
/// use omtools_core::testing::{MockBackend, fixtures};
///
/// let backend = MockBackend::new();
/// backend.push_fetch_err(Status::unavailable("warming up")).await;
/// backend.push_fetch_ok(vec![fixtures::match_record("m1")]).await;
///
/// // ... run a director ...
///
/// assert_eq!(backend.fetch_count().await, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Queued fetch outcomes.
    fetch_outcomes: Arc<RwLock<VecDeque<FetchOutcome>>>,
    /// Queued assign outcomes.
    assign_outcomes: Arc<RwLock<VecDeque<AssignOutcome>>>,
    /// Matches streamed when no fetch outcome is queued.
    default_matches: Arc<RwLock<Vec<Match>>>,
    /// Simulated latency before a fetch stream opens.
    fetch_delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded fetch requests.
    fetch_requests: Arc<RwLock<Vec<FetchMatchesRequest>>>,
    /// Recorded assign requests.
    assign_requests: Arc<RwLock<Vec<AssignTicketsRequest>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock backend that returns no matches.
    pub fn new() -> Self {
        Self {
            fetch_outcomes: Arc::new(RwLock::new(VecDeque::new())),
            assign_outcomes: Arc::new(RwLock::new(VecDeque::new())),
            default_matches: Arc::new(RwLock::new(Vec::new())),
            fetch_delay: Arc::new(RwLock::new(None)),
            fetch_requests: Arc::new(RwLock::new(Vec::new())),
            assign_requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a fetch that streams `matches` and ends normally.
    pub async fn push_fetch_ok(&self, matches: Vec<Match>) {
        self.fetch_outcomes
            .write()
            .await
            .push_back(FetchOutcome::Matches(matches));
    }

    /// Queue a fetch that fails before streaming anything.
    pub async fn push_fetch_err(&self, status: Status) {
        self.fetch_outcomes
            .write()
            .await
            .push_back(FetchOutcome::Fail(status));
    }

    /// Queue a fetch that streams `matches` and then fails.
    pub async fn push_fetch_partial(&self, matches: Vec<Match>, status: Status) {
        self.fetch_outcomes
            .write()
            .await
            .push_back(FetchOutcome::Partial(matches, status));
    }

    /// Queue a fetch whose stream never yields.
    pub async fn push_fetch_hang(&self) {
        self.fetch_outcomes
            .write()
            .await
            .push_back(FetchOutcome::Hang);
    }

    /// Matches streamed whenever the fetch queue is empty.
    pub async fn set_default_matches(&self, matches: Vec<Match>) {
        *self.default_matches.write().await = matches;
    }

    /// Delay every fetch before the stream opens.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.write().await = Some(delay);
    }

    /// Queue a successful assign response.
    pub async fn push_assign_ok(&self, response: AssignTicketsResponse) {
        self.assign_outcomes
            .write()
            .await
            .push_back(AssignOutcome::Respond(Ok(response)));
    }

    /// Queue a failed assign call.
    pub async fn push_assign_err(&self, status: Status) {
        self.assign_outcomes
            .write()
            .await
            .push_back(AssignOutcome::Respond(Err(status)));
    }

    /// Queue an assign call that never returns.
    pub async fn push_assign_hang(&self) {
        self.assign_outcomes
            .write()
            .await
            .push_back(AssignOutcome::Hang);
    }

    /// Number of fetch calls made.
    pub async fn fetch_count(&self) -> usize {
        self.fetch_requests.read().await.len()
    }

    /// Get recorded fetch requests.
    pub async fn fetch_requests(&self) -> Vec<FetchMatchesRequest> {
        self.fetch_requests.read().await.clone()
    }

    /// Get recorded assign requests, failed ones included.
    pub async fn assign_requests(&self) -> Vec<AssignTicketsRequest> {
        self.assign_requests.read().await.clone()
    }
}

fn responses(matches: Vec<Match>) -> impl Iterator<Item = Result<FetchMatchesResponse, Status>> {
    matches
        .into_iter()
        .map(|m| Ok(FetchMatchesResponse { r#match: m }))
}

#[async_trait]
impl Backend for MockBackend {
    async fn fetch_matches(&self, request: FetchMatchesRequest) -> Result<MatchStream, Status> {
        self.fetch_requests.write().await.push(request);

        let delay = *self.fetch_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.fetch_outcomes.write().await.pop_front();
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => FetchOutcome::Matches(self.default_matches.read().await.clone()),
        };

        match outcome {
            FetchOutcome::Matches(matches) => Ok(stream::iter(responses(matches)).boxed()),
            FetchOutcome::Partial(matches, status) => Ok(stream::iter(responses(matches))
                .chain(stream::once(async move { Err(status) }))
                .boxed()),
            FetchOutcome::Fail(status) => Err(status),
            FetchOutcome::Hang => Ok(stream::pending().boxed()),
        }
    }

    async fn assign_tickets(
        &self,
        request: AssignTicketsRequest,
    ) -> Result<AssignTicketsResponse, Status> {
        self.assign_requests.write().await.push(request);

        let outcome = self.assign_outcomes.write().await.pop_front();
        match outcome {
            Some(AssignOutcome::Respond(result)) => result,
            Some(AssignOutcome::Hang) => std::future::pending().await,
            None => Ok(AssignTicketsResponse::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn request() -> FetchMatchesRequest {
        FetchMatchesRequest {
            config: fixtures::function_config(),
            profile: fixtures::match_profile("p"),
        }
    }

    #[tokio::test]
    async fn test_queued_outcomes_then_default() {
        let backend = MockBackend::new();
        backend.push_fetch_err(Status::unavailable("down")).await;
        backend.set_default_matches(vec![fixtures::match_record("d")]).await;

        assert!(backend.fetch_matches(request()).await.is_err());

        let stream = backend.fetch_matches(request()).await.unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().r#match.match_id, "d");
        assert_eq!(backend.fetch_count().await, 2);
    }

    #[tokio::test]
    async fn test_partial_stream_ends_with_error() {
        let backend = MockBackend::new();
        backend
            .push_fetch_partial(vec![fixtures::match_record("m1")], Status::internal("reset"))
            .await;

        let items: Vec<_> = backend.fetch_matches(request()).await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_assign_hang_never_returns() {
        let backend = MockBackend::new();
        backend.push_assign_hang().await;

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            backend.assign_tickets(AssignTicketsRequest::default()),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(backend.assign_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_assign_defaults_to_success() {
        let backend = MockBackend::new();
        let response = backend
            .assign_tickets(AssignTicketsRequest::default())
            .await
            .unwrap();
        assert!(response.failures.is_empty());
        assert_eq!(backend.assign_requests().await.len(), 1);
    }
}
