//! Wait configuration
//!
//! A [`WaitSpec`] describes one reconciliation run: which states mean
//! "keep polling", which mean "done", and how long and how often to poll.

use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Invalid wait configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("target state set is empty")]
    EmptyTarget,

    #[error("state '{0}' is listed as both pending and target")]
    Overlap(String),
}

/// Immutable configuration for one reconciliation run
#[derive(Debug, Clone)]
pub struct WaitSpec {
    /// States in which polling continues
    pub pending: BTreeSet<String>,

    /// States that end the wait successfully
    pub target: BTreeSet<String>,

    /// Wall-clock budget for the whole run
    pub timeout: Duration,

    /// Base delay between probes
    pub poll_interval: Duration,

    /// Floor for the computed delay
    pub min_poll_interval: Duration,

    /// Ceiling for the backoff
    pub max_poll_interval: Duration,

    /// Backoff multiplier applied per attempt
    pub multiplier: f64,

    /// Identifier of the watched object, used in diagnostics
    pub subject: String,
}

impl WaitSpec {
    pub fn new<P, T, S>(pending: P, target: T) -> Self
    where
        P: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            subject: String::from("object"),
        }
    }

    /// Spec for kinds that complete synchronously: one probe, no retry loop
    pub fn single<T, S>(target: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::<String>::new(), target.into_iter().map(Into::into))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    /// Configure the multiplicative backoff and its ceiling
    pub fn backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_poll_interval = max_interval;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Add a pending label (used by callers that synthesize states)
    pub fn with_pending(mut self, state: impl Into<String>) -> Self {
        self.pending.insert(state.into());
        self
    }

    /// Add a target label
    pub fn with_target(mut self, state: impl Into<String>) -> Self {
        self.target.insert(state.into());
        self
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.target.is_empty() {
            return Err(SpecError::EmptyTarget);
        }
        if let Some(state) = self.pending.intersection(&self.target).next() {
            return Err(SpecError::Overlap(state.clone()));
        }
        Ok(())
    }

    pub fn is_pending(&self, state: &str) -> bool {
        self.pending.contains(state)
    }

    pub fn is_target(&self, state: &str) -> bool {
        self.target.contains(state)
    }

    /// Delay to sleep after the given (zero-based) attempt, before the
    /// remaining-budget clamp is applied.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.multiplier.max(1.0);
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let scaled = self.poll_interval.as_secs_f64() * multiplier.powi(exponent);

        let ceiling = self.max_poll_interval.max(self.min_poll_interval);
        let delay = if scaled.is_finite() && scaled < ceiling.as_secs_f64() {
            Duration::from_secs_f64(scaled)
        } else {
            ceiling
        };

        delay.max(self.min_poll_interval)
    }

    /// States a caller may legitimately observe, for error messages
    pub(crate) fn expected_states(&self) -> Vec<String> {
        self.pending.iter().chain(self.target.iter()).cloned().collect()
    }
}
