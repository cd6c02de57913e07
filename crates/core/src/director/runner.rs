//! Match director implementation.
//!
//! One logical task per director: ticks are processed strictly in order and a
//! tick that overruns its period delays the next one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{
    AssignTicketsRequest, AssignmentGroup, Backend, FetchMatchesRequest, FunctionConfig, Match,
    MatchProfile,
};
use crate::dump::dump;
use crate::metrics;
use crate::retry::{retry, Backoff, ErrorClassifier, RetryConfig};

use super::config::DirectorConfig;
use super::types::{Assigner, DirectorError, DirectorState};

/// Smallest accepted tick period.
const MIN_TICK_RATE: Duration = Duration::from_millis(1);

/// Fetches matches for one profile and dispatches their assignments.
pub struct Director {
    backend: Arc<dyn Backend>,
    profile: MatchProfile,
    function_config: FunctionConfig,
    assigner: Arc<dyn Assigner>,
    retry_config: RetryConfig,
    classifier: ErrorClassifier,
    /// Set once `with_classifier` installs a classifier of its own.
    custom_classifier: bool,
    state: watch::Sender<DirectorState>,
}

impl Director {
    /// Create a director with the default retry policy.
    pub fn new(
        backend: Arc<dyn Backend>,
        profile: MatchProfile,
        function_config: FunctionConfig,
        assigner: Arc<dyn Assigner>,
    ) -> Self {
        let (state, _) = watch::channel(DirectorState::Idle);

        Self {
            backend,
            profile,
            function_config,
            assigner,
            retry_config: RetryConfig::default(),
            classifier: ErrorClassifier::default(),
            custom_classifier: false,
            state,
        }
    }

    /// Create a director from loaded configuration.
    pub fn from_config(
        config: &DirectorConfig,
        backend: Arc<dyn Backend>,
        profile: MatchProfile,
        function_config: FunctionConfig,
        assigner: Arc<dyn Assigner>,
    ) -> Self {
        Self::new(backend, profile, function_config, assigner)
            .with_retry_config(config.retry.clone())
    }

    /// Set the retry policy.
    ///
    /// Unless a classifier was installed with `with_classifier`, the classifier
    /// is rebuilt from the policy's marker.
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        if !self.custom_classifier {
            self.classifier =
                ErrorClassifier::with_marker(retry_config.unavailable_marker.clone());
        }
        self.retry_config = retry_config;
        self
    }

    /// Replace the error classifier. Later `with_retry_config` calls keep it.
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self.custom_classifier = true;
        self
    }

    pub fn profile(&self) -> &MatchProfile {
        &self.profile
    }

    pub fn state(&self) -> DirectorState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<DirectorState> {
        self.state.subscribe()
    }

    /// Tick every `tick_rate` until cancelled or a tick fails fatally.
    ///
    /// The first tick fires one period after the call. Returns
    /// `DirectorError::Cancelled` when `cancel` fires; any other error means a
    /// fetch or assign failed fatally (or ran out of retries) and the director
    /// has stopped. Restarting is up to the caller.
    pub async fn run(
        &self,
        tick_rate: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DirectorError> {
        info!(
            profile = %self.profile.name,
            "Director started (tick rate: {:?})",
            tick_rate
        );

        let result = self.tick_loop(tick_rate, cancel).await;
        self.set_state(DirectorState::Stopped);

        match &result {
            Err(e) if e.is_cancelled() => {
                info!(profile = %self.profile.name, "Director stopped");
            }
            Err(e) => {
                metrics::FATAL_ERRORS
                    .with_label_values(&[e.operation()])
                    .inc();
                error!(profile = %self.profile.name, "Director failed: {}", e);
            }
            Ok(()) => {}
        }
        result
    }

    async fn tick_loop(
        &self,
        tick_rate: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DirectorError> {
        if tick_rate < MIN_TICK_RATE {
            warn!("Tick rate {:?} too small, using {:?}", tick_rate, MIN_TICK_RATE);
        }
        let period = tick_rate.max(MIN_TICK_RATE);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DirectorError::Cancelled),
                _ = ticker.tick() => {}
            }
            self.run_once(cancel).await?;
        }
    }

    /// Do one tick's work: retried fetch, then retried assign if there were
    /// matches. Returns the assignment groups sent to the backend.
    pub async fn run_once(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<AssignmentGroup>, DirectorError> {
        let result = self.tick(cancel).await;
        self.set_state(DirectorState::Idle);
        result
    }

    async fn tick(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<AssignmentGroup>, DirectorError> {
        self.set_state(DirectorState::FetchingMatches);
        let matches = self
            .retrying("fetch_matches", cancel, move |_| self.fetch_matches(cancel))
            .await?;

        if matches.is_empty() {
            debug!(profile = %self.profile.name, "No matches this tick");
            metrics::TICKS.with_label_values(&["empty"]).inc();
            return Ok(Vec::new());
        }

        // A failed assign never triggers a new fetch; this batch is the tick's.
        self.set_state(DirectorState::AssigningMatches);
        let batch = matches.as_slice();
        let groups = self
            .retrying("assign_tickets", cancel, move |_| {
                self.assign_tickets(batch, cancel)
            })
            .await?;

        metrics::TICKS.with_label_values(&["assigned"]).inc();
        info!(
            profile = %self.profile.name,
            matches = matches.len(),
            groups = groups.len(),
            "Assigned tickets"
        );
        Ok(groups)
    }

    /// Open the fetch stream and drain it into one batch. Single attempt.
    pub async fn fetch_matches(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Match>, DirectorError> {
        let request = FetchMatchesRequest {
            config: self.function_config.clone(),
            profile: self.profile.clone(),
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DirectorError::Cancelled),
            result = self.backend.fetch_matches(request) => result.map_err(DirectorError::Fetch)?,
        };

        let mut matches = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DirectorError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(response)) => matches.push(response.r#match),
                Some(Err(status)) => return Err(DirectorError::Recv(status)),
                None => break,
            }
        }

        metrics::MATCHES_FETCHED.inc_by(matches.len() as u64);
        debug!(count = matches.len(), "Fetched matches");
        Ok(matches)
    }

    /// Run the assigner over `matches` and send the groups to the backend.
    /// Single attempt.
    pub async fn assign_tickets(
        &self,
        matches: &[Match],
        cancel: &CancellationToken,
    ) -> Result<Vec<AssignmentGroup>, DirectorError> {
        let groups = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DirectorError::Cancelled),
            result = self.assigner.assign(matches) => result.map_err(DirectorError::Assigner)?,
        };

        for group in &groups {
            debug!("Assignment group: {}", dump(group));
        }

        let request = AssignTicketsRequest {
            assignments: groups.clone(),
        };
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DirectorError::Cancelled),
            result = self.backend.assign_tickets(request) => {
                result.map_err(DirectorError::AssignTickets)?
            }
        };

        for failure in &response.failures {
            warn!(
                ticket_id = %failure.ticket_id,
                cause = ?failure.cause,
                "Backend could not assign ticket"
            );
        }
        metrics::ASSIGNMENT_FAILURES.inc_by(response.failures.len() as u64);
        metrics::ASSIGNMENT_GROUPS.inc_by(groups.len() as u64);

        Ok(groups)
    }

    /// Retry `operation` with a fresh backoff sequence.
    async fn retrying<T, F, Fut>(
        &self,
        name: &'static str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, DirectorError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DirectorError>>,
    {
        let classifier = &self.classifier;
        retry(
            name,
            Backoff::new(&self.retry_config),
            cancel,
            |err: &DirectorError| classifier.is_retryable(err),
            operation,
        )
        .await
        .map_err(|e| e.into_inner().unwrap_or(DirectorError::Cancelled))
    }

    fn set_state(&self, state: DirectorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = previous.as_str(), to = state.as_str(), "Director state changed");
        }
    }
}
