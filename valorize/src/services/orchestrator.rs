use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::{Result, ValorizeError};
use crate::models::{ScoringRequest, ScoringResponse, SubmissionInput};
use crate::scoring::ScoringBackend;

/// Lifecycle of a target's request. Settling, successful or not, happens under the
/// same lock that clears tracking, so a target goes from `InFlight` straight back to
/// `Idle`; a failure leaves its message behind in `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Requested,
    InFlight,
}

/// What a scoring request will write to once it completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestTarget {
    /// Submit or save-as-new; the result becomes a new analysis.
    NewAnalysis,
    /// Recompute of the analysis with this id.
    Existing(String),
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewAnalysis => write!(f, "new"),
            Self::Existing(id) => write!(f, "{id}"),
        }
    }
}

/// Handle for one issued request, carried from `begin` through `settle`.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    target: RequestTarget,
    generation: u64,
    input: SubmissionInput,
    cancel: CancellationToken,
}

impl RequestTicket {
    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The exact title and abstract captured when the request was issued.
    pub fn input(&self) -> &SubmissionInput {
        &self.input
    }
}

struct TrackedRequest {
    generation: u64,
    phase: RequestPhase,
    input: SubmissionInput,
    cancel: CancellationToken,
}


#[derive(Default)]
struct Lifecycle {
    next_generation: u64,
    tracked: HashMap<RequestTarget, TrackedRequest>,
    failures: HashMap<RequestTarget, String>,
}

/// Tracks at most one live scoring request per target.
///
/// A newer `begin` on the same target cancels the older request, and a result is only
/// applied by `settle` if its ticket is still the tracked one and was seen in flight.
#[derive(Clone, Default)]
pub struct RequestOrchestrator {
    inner: Arc<Mutex<Lifecycle>>,
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, target: RequestTarget, input: SubmissionInput) -> RequestTicket {
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        let cancel = CancellationToken::new();

        let tracked = TrackedRequest {
            generation,
            phase: RequestPhase::Requested,
            input: input.clone(),
            cancel: cancel.clone(),
        };
        if let Some(previous) = state.tracked.insert(target.clone(), tracked) {
            previous.cancel.cancel();
            tracing::debug!(
                request_target = %target,
                superseded = previous.generation,
                generation,
                "Request superseded"
            );
        }
        state.failures.remove(&target);

        RequestTicket {
            target,
            generation,
            input,
            cancel,
        }
    }

    /// Marks the request in flight, then runs the scoring call until it finishes or the
    /// request is superseded.
    pub async fn dispatch(
        &self,
        ticket: &RequestTicket,
        backend: &dyn ScoringBackend,
    ) -> Result<ScoringResponse> {
        {
            let mut state = self.lock();
            match state.tracked.get_mut(&ticket.target) {
                Some(tracked) if tracked.generation == ticket.generation => {
                    tracked.phase = RequestPhase::InFlight;
                }
                _ => return Err(ValorizeError::Superseded),
            }
        }

        let request = ScoringRequest::from(&ticket.input);
        tokio::select! {
            biased;
            _ = ticket.cancel.cancelled() => Err(ValorizeError::Superseded),
            result = backend.score(&request) => result,
        }
    }

    /// Runs `apply` only if `ticket` is still the live in-flight request for its target.
    ///
    /// Returns `None` for a stale ticket. Otherwise the target goes back to idle and the
    /// outcome of `apply` is recorded.
    pub fn settle<T>(
        &self,
        ticket: &RequestTicket,
        apply: impl FnOnce() -> Result<T>,
    ) -> Option<Result<T>> {
        let mut state = self.lock();
        let is_live = matches!(
            state.tracked.get(&ticket.target),
            Some(tracked) if tracked.generation == ticket.generation
                && tracked.phase == RequestPhase::InFlight
        );
        if !is_live {
            tracing::debug!(
                request_target = %ticket.target,
                generation = ticket.generation,
                "Discarding result of stale request"
            );
            return None;
        }

        let outcome = apply();
        state.tracked.remove(&ticket.target);

        if let Err(e) = &outcome {
            tracing::warn!(
                request_target = %ticket.target,
                generation = ticket.generation,
                error = %e,
                "Request failed"
            );
            state
                .failures
                .insert(ticket.target.clone(), e.user_message());
        }

        Some(outcome)
    }

    /// Stops tracking a target and cancels its in-flight call, if any.
    pub fn cancel(&self, target: &RequestTarget) -> bool {
        let mut state = self.lock();
        state.failures.remove(target);
        match state.tracked.remove(target) {
            Some(tracked) => {
                tracked.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn phase(&self, target: &RequestTarget) -> RequestPhase {
        self.lock()
            .tracked
            .get(target)
            .map(|t| t.phase)
            .unwrap_or(RequestPhase::Idle)
    }

    pub fn captured_input(&self, target: &RequestTarget) -> Option<SubmissionInput> {
        self.lock().tracked.get(target).map(|t| t.input.clone())
    }

    pub fn last_error(&self, target: &RequestTarget) -> Option<String> {
        self.lock().failures.get(target).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedScorer;

    #[async_trait]
    impl ScoringBackend for FixedScorer {
        async fn score(&self, _request: &ScoringRequest) -> Result<ScoringResponse> {
            Ok(ScoringResponse {
                novelty_score: 50.0,
                ..Default::default()
            })
        }
    }

    struct NeverScorer;

    #[async_trait]
    impl ScoringBackend for NeverScorer {
        async fn score(&self, _request: &ScoringRequest) -> Result<ScoringResponse> {
            std::future::pending().await
        }
    }

    fn input(title: &str) -> SubmissionInput {
        SubmissionInput::new(title, "abstract").unwrap()
    }

    #[test]
    fn test_begin_captures_input() {
        let orchestrator = RequestOrchestrator::new();
        let ticket = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));

        assert_eq!(ticket.input().title, "First");
        assert_eq!(orchestrator.phase(&RequestTarget::NewAnalysis), RequestPhase::Requested);
        assert_eq!(
            orchestrator.captured_input(&RequestTarget::NewAnalysis),
            Some(input("First"))
        );
    }

    #[tokio::test]
    async fn test_successful_settle_returns_to_idle() {
        let orchestrator = RequestOrchestrator::new();
        let ticket = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));

        let response = orchestrator.dispatch(&ticket, &FixedScorer).await.unwrap();
        let applied = orchestrator.settle(&ticket, || Ok(response.novelty_score));

        assert_eq!(applied.unwrap().unwrap(), 50.0);
        assert_eq!(orchestrator.phase(&RequestTarget::NewAnalysis), RequestPhase::Idle);
        assert_eq!(orchestrator.captured_input(&RequestTarget::NewAnalysis), None);
        assert_eq!(orchestrator.last_error(&RequestTarget::NewAnalysis), None);
    }

    #[tokio::test]
    async fn test_failed_settle_records_message() {
        let orchestrator = RequestOrchestrator::new();
        let ticket = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));
        orchestrator.dispatch(&ticket, &FixedScorer).await.unwrap();

        let outcome = orchestrator.settle(&ticket, || Err::<(), _>(ValorizeError::EmptyResult));

        assert!(matches!(outcome, Some(Err(ValorizeError::EmptyResult))));
        assert_eq!(orchestrator.phase(&RequestTarget::NewAnalysis), RequestPhase::Idle);
        assert_eq!(
            orchestrator.last_error(&RequestTarget::NewAnalysis),
            Some(ValorizeError::EmptyResult.user_message())
        );
    }

    #[tokio::test]
    async fn test_superseded_ticket_is_not_applied() {
        let orchestrator = RequestOrchestrator::new();
        let first = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));
        orchestrator.dispatch(&first, &FixedScorer).await.unwrap();

        let second = orchestrator.begin(RequestTarget::NewAnalysis, input("Second"));
        assert!(second.generation() > first.generation());

        let mut applied = false;
        let outcome = orchestrator.settle(&first, || {
            applied = true;
            Ok(())
        });
        assert!(outcome.is_none());
        assert!(!applied);
        assert_eq!(
            orchestrator.captured_input(&RequestTarget::NewAnalysis),
            Some(input("Second"))
        );
    }

    #[test]
    fn test_settle_requires_in_flight() {
        let orchestrator = RequestOrchestrator::new();
        let ticket = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));

        assert!(orchestrator.settle(&ticket, || Ok(())).is_none());
    }

    #[tokio::test]
    async fn test_supersession_cancels_in_flight_call() {
        let orchestrator = RequestOrchestrator::new();
        let first = orchestrator.begin(RequestTarget::NewAnalysis, input("First"));

        let pending = {
            let orchestrator = orchestrator.clone();
            let first = first.clone();
            tokio::spawn(async move { orchestrator.dispatch(&first, &NeverScorer).await })
        };

        while orchestrator.phase(&RequestTarget::NewAnalysis) != RequestPhase::InFlight {
            tokio::task::yield_now().await;
        }
        orchestrator.begin(RequestTarget::NewAnalysis, input("Second"));

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(ValorizeError::Superseded)));
    }

    #[tokio::test]
    async fn test_targets_are_independent() {
        let orchestrator = RequestOrchestrator::new();
        let existing = RequestTarget::Existing("a1".to_string());

        let recompute = orchestrator.begin(existing.clone(), input("Edited"));
        orchestrator.begin(RequestTarget::NewAnalysis, input("Fresh"));
        orchestrator.dispatch(&recompute, &FixedScorer).await.unwrap();

        assert!(orchestrator.settle(&recompute, || Ok(())).is_some());
        assert_eq!(orchestrator.phase(&RequestTarget::NewAnalysis), RequestPhase::Requested);
    }

    #[tokio::test]
    async fn test_cancel_drops_tracking() {
        let orchestrator = RequestOrchestrator::new();
        let target = RequestTarget::Existing("a1".to_string());
        let ticket = orchestrator.begin(target.clone(), input("Edited"));

        assert!(orchestrator.cancel(&target));
        assert_eq!(orchestrator.phase(&target), RequestPhase::Idle);
        assert!(matches!(
            orchestrator.dispatch(&ticket, &FixedScorer).await,
            Err(ValorizeError::Superseded)
        ));
    }
}
