//! Probe contract
//!
//! A probe performs one state query against the remote API and reports
//! what it saw. The engine never interprets the payload.

use std::time::Duration;

/// Result of one successful probe
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<R> {
    /// State label reported by the remote API (or synthesized by the caller)
    pub state: String,

    /// Raw object, if one was returned
    pub raw: Option<R>,
}

impl<R> Observation<R> {
    pub fn new(state: impl Into<String>, raw: R) -> Self {
        Self {
            state: state.into(),
            raw: Some(raw),
        }
    }

    /// Observation carrying only a label, e.g. a synthetic `DELETED`
    pub fn label(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            raw: None,
        }
    }
}

/// Errors returned by a probe must say whether they mean "object absent"
pub trait ProbeError: std::error::Error + Send + Sync + 'static {
    fn is_not_found(&self) -> bool;
}

/// Successful end of a wait
#[derive(Debug, Clone)]
pub struct Converged<R> {
    /// Target state that ended the wait
    pub state: String,

    /// Raw object from the final probe
    pub raw: Option<R>,

    /// Number of probes issued
    pub attempts: u32,

    /// Time spent waiting
    pub elapsed: Duration,
}
