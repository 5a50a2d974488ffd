//! Polling loop
//!
//! Probes are issued strictly one after another. The first probe runs
//! immediately; later ones follow an exponential backoff that never sleeps
//! past the run's deadline.

use crate::error::WaitError;
use crate::probe::{Converged, Observation, ProbeError};
use crate::spec::WaitSpec;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Per-run bookkeeping. Created on entry, dropped on return.
struct RunState<R> {
    started: Instant,
    attempts: u32,
    last_state: Option<String>,
    last_raw: Option<R>,
}

impl<R> RunState<R> {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            attempts: 0,
            last_state: None,
            last_raw: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn record(&mut self, observation: Observation<R>) {
        self.last_state = Some(observation.state);
        self.last_raw = observation.raw;
    }

    fn timed_out(self, spec: &WaitSpec) -> WaitError<R> {
        let elapsed = self.elapsed();
        tracing::warn!(
            "Timed out waiting for {} after {} probes ({:.1?}), last state: {:?}",
            spec.subject,
            self.attempts,
            elapsed,
            self.last_state
        );
        WaitError::Timeout {
            subject: spec.subject.clone(),
            last_state: self.last_state,
            elapsed,
            timeout: spec.timeout,
            last_raw: self.last_raw,
        }
    }

    fn cancelled(self, spec: &WaitSpec) -> WaitError<R> {
        let elapsed = self.elapsed();
        tracing::info!(
            "Wait for {} cancelled after {} probes ({:.1?})",
            spec.subject,
            self.attempts,
            elapsed
        );
        WaitError::Cancelled {
            subject: spec.subject.clone(),
            last_state: self.last_state,
            elapsed,
            last_raw: self.last_raw,
        }
    }

    fn not_found(self, spec: &WaitSpec) -> WaitError<R> {
        let elapsed = self.elapsed();
        tracing::debug!("{} not found on probe {}", spec.subject, self.attempts);
        WaitError::NotFound {
            subject: spec.subject.clone(),
            last_state: self.last_state,
            elapsed,
            last_raw: self.last_raw,
        }
    }
}

/// Block until the probed object reaches a target state.
///
/// Resolves to:
/// * `Ok(Converged)` - a probe reported a state in `spec.target`
/// * `WaitError::UnexpectedState` - a probe reported a state in neither set
/// * `WaitError::NotFound` - the probe failed with a not-found error
/// * `WaitError::ProbeFailure` - the probe failed with any other error (never retried)
/// * `WaitError::Timeout` - `spec.timeout` ran out while still pending
/// * `WaitError::Cancelled` - `cancel` fired during a probe or a sleep
pub async fn wait<R, E, F, Fut>(
    spec: &WaitSpec,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<Converged<R>, WaitError<R>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<R>, E>>,
    E: ProbeError,
{
    if let Err(source) = spec.validate() {
        return Err(WaitError::InvalidSpec {
            subject: spec.subject.clone(),
            source,
        });
    }

    let mut run = RunState::start();
    let deadline = run
        .started
        .checked_add(spec.timeout)
        .unwrap_or_else(|| run.started + FAR_FUTURE);

    loop {
        if cancel.is_cancelled() {
            return Err(run.cancelled(spec));
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(run.cancelled(spec)),
            outcome = probe() => outcome,
        };
        run.attempts += 1;

        let observation = match outcome {
            Ok(observation) => observation,
            Err(err) if err.is_not_found() => return Err(run.not_found(spec)),
            Err(err) => {
                tracing::debug!("Probe {} for {} failed: {}", run.attempts, spec.subject, err);
                return Err(WaitError::ProbeFailure {
                    subject: spec.subject.clone(),
                    source: Box::new(err),
                });
            }
        };

        tracing::debug!(
            "Probe {} for {}: state {}",
            run.attempts,
            spec.subject,
            observation.state
        );

        if spec.is_target(&observation.state) {
            let elapsed = run.elapsed();
            tracing::info!(
                "{} reached {} after {} probes ({:.1?})",
                spec.subject,
                observation.state,
                run.attempts,
                elapsed
            );
            return Ok(Converged {
                state: observation.state,
                raw: observation.raw,
                attempts: run.attempts,
                elapsed,
            });
        }

        if !spec.is_pending(&observation.state) {
            tracing::warn!(
                "{} entered unexpected state {}",
                spec.subject,
                observation.state
            );
            return Err(WaitError::UnexpectedState {
                subject: spec.subject.clone(),
                state: observation.state,
                expected: spec.expected_states(),
                raw: observation.raw,
            });
        }

        run.record(observation);

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(run.timed_out(spec));
        }

        let delay = spec.delay_for_attempt(run.attempts - 1).min(remaining);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(run.cancelled(spec)),
            _ = sleep(delay) => {}
        }

        if Instant::now() >= deadline {
            return Err(run.timed_out(spec));
        }
    }
}

/// [`wait`] without an external cancellation signal
pub async fn wait_for_state<R, E, F, Fut>(
    spec: &WaitSpec,
    probe: F,
) -> Result<Converged<R>, WaitError<R>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<R>, E>>,
    E: ProbeError,
{
    wait(spec, &CancellationToken::new(), probe).await
}
