//! Wait error taxonomy

use crate::spec::SpecError;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ways a wait can end without reaching a target state.
///
/// `R` is the probe's raw payload type. Variants that end after at least one
/// successful probe keep the last payload so callers can record what the
/// remote API reported before giving up.
#[derive(Error, Debug)]
pub enum WaitError<R> {
    #[error("invalid wait configuration for {subject}: {source}")]
    InvalidSpec {
        subject: String,
        #[source]
        source: SpecError,
    },

    #[error("{subject} not found (last state: {})", show_state(.last_state))]
    NotFound {
        subject: String,
        last_state: Option<String>,
        elapsed: Duration,
        last_raw: Option<R>,
    },

    #[error("{subject} entered unexpected state '{state}', wanted one of [{}]", .expected.join(", "))]
    UnexpectedState {
        subject: String,
        state: String,
        expected: Vec<String>,
        raw: Option<R>,
    },

    #[error(
        "timeout while waiting for {subject} after {:.0?} (limit {:.0?}, last state: {})",
        .elapsed,
        .timeout,
        show_state(.last_state)
    )]
    Timeout {
        subject: String,
        last_state: Option<String>,
        elapsed: Duration,
        timeout: Duration,
        last_raw: Option<R>,
    },

    #[error("wait for {subject} cancelled after {:.0?} (last state: {})", .elapsed, show_state(.last_state))]
    Cancelled {
        subject: String,
        last_state: Option<String>,
        elapsed: Duration,
        last_raw: Option<R>,
    },

    #[error("probe for {subject} failed: {source}")]
    ProbeFailure { subject: String, source: BoxError },
}

fn show_state(state: &Option<String>) -> &str {
    state.as_deref().unwrap_or("none")
}

/// Payload-free classification of a [`WaitError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitErrorKind {
    InvalidSpec,
    NotFound,
    UnexpectedState,
    Timeout,
    Cancelled,
    ProbeFailure,
}

impl std::fmt::Display for WaitErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitErrorKind::InvalidSpec => write!(f, "invalid-spec"),
            WaitErrorKind::NotFound => write!(f, "not-found"),
            WaitErrorKind::UnexpectedState => write!(f, "unexpected-state"),
            WaitErrorKind::Timeout => write!(f, "timeout"),
            WaitErrorKind::Cancelled => write!(f, "cancelled"),
            WaitErrorKind::ProbeFailure => write!(f, "probe-failure"),
        }
    }
}

impl<R> WaitError<R> {
    pub fn kind(&self) -> WaitErrorKind {
        match self {
            WaitError::InvalidSpec { .. } => WaitErrorKind::InvalidSpec,
            WaitError::NotFound { .. } => WaitErrorKind::NotFound,
            WaitError::UnexpectedState { .. } => WaitErrorKind::UnexpectedState,
            WaitError::Timeout { .. } => WaitErrorKind::Timeout,
            WaitError::Cancelled { .. } => WaitErrorKind::Cancelled,
            WaitError::ProbeFailure { .. } => WaitErrorKind::ProbeFailure,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            WaitError::InvalidSpec { subject, .. }
            | WaitError::NotFound { subject, .. }
            | WaitError::UnexpectedState { subject, .. }
            | WaitError::Timeout { subject, .. }
            | WaitError::Cancelled { subject, .. }
            | WaitError::ProbeFailure { subject, .. } => subject,
        }
    }

    /// Last state label observed before the wait ended
    pub fn last_state(&self) -> Option<&str> {
        match self {
            WaitError::NotFound { last_state, .. }
            | WaitError::Timeout { last_state, .. }
            | WaitError::Cancelled { last_state, .. } => last_state.as_deref(),
            WaitError::UnexpectedState { state, .. } => Some(state),
            WaitError::InvalidSpec { .. } | WaitError::ProbeFailure { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == WaitErrorKind::Timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == WaitErrorKind::Cancelled
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == WaitErrorKind::NotFound
    }

    /// Take the last raw payload, leaving a payload-free error behind
    pub fn split_last_raw(self) -> (WaitError<()>, Option<R>) {
        let mut taken = None;
        let erased = self.map_raw(|raw| {
            taken = Some(raw);
        });
        (erased, taken)
    }

    pub fn into_last_raw(self) -> Option<R> {
        self.split_last_raw().1
    }

    /// Drop the payload so the error can cross crate boundaries untyped
    pub fn erase(self) -> WaitError<()> {
        self.map_raw(|_| ())
    }

    pub fn map_raw<U>(self, f: impl FnOnce(R) -> U) -> WaitError<U> {
        match self {
            WaitError::InvalidSpec { subject, source } => WaitError::InvalidSpec { subject, source },
            WaitError::NotFound {
                subject,
                last_state,
                elapsed,
                last_raw,
            } => WaitError::NotFound {
                subject,
                last_state,
                elapsed,
                last_raw: last_raw.map(f),
            },
            WaitError::UnexpectedState {
                subject,
                state,
                expected,
                raw,
            } => WaitError::UnexpectedState {
                subject,
                state,
                expected,
                raw: raw.map(f),
            },
            WaitError::Timeout {
                subject,
                last_state,
                elapsed,
                timeout,
                last_raw,
            } => WaitError::Timeout {
                subject,
                last_state,
                elapsed,
                timeout,
                last_raw: last_raw.map(f),
            },
            WaitError::Cancelled {
                subject,
                last_state,
                elapsed,
                last_raw,
            } => WaitError::Cancelled {
                subject,
                last_state,
                elapsed,
                last_raw: last_raw.map(f),
            },
            WaitError::ProbeFailure { subject, source } => {
                WaitError::ProbeFailure { subject, source }
            }
        }
    }
}
