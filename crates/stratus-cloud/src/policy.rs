//! Not-found handling per orchestrator
//!
//! Whether "object not found" means success, lag, or failure depends on the
//! operation. Each orchestrator picks one of these policies explicitly.

use crate::error::{CloudError, Result};
use crate::model::RemoteObject;
use std::time::Duration;
use stratus_wait::{Observation, WaitSpec};
use tokio::time::Instant;

/// Synthetic target label for "the object is gone"
pub const STATE_DELETED: &str = "DELETED";

/// Synthetic pending label for "not visible yet, still inside the grace window"
pub const STATE_NOT_VISIBLE: &str = "NOT_VISIBLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Not found ends the wait with a not-found error
    Fatal,
    /// Not found within the window after the mutating call is eventual
    /// consistency lag; afterwards it is fatal
    Grace(Duration),
    /// Not found is the target: the object was deleted
    Deleted,
}

impl NotFoundPolicy {
    /// Add the synthetic label this policy produces to the `WaitSpec`
    pub fn prepare(&self, spec: WaitSpec) -> WaitSpec {
        match self {
            NotFoundPolicy::Fatal => spec,
            NotFoundPolicy::Grace(window) if window.is_zero() => spec,
            NotFoundPolicy::Grace(_) => spec.with_pending(STATE_NOT_VISIBLE),
            NotFoundPolicy::Deleted => spec.with_target(STATE_DELETED),
        }
    }

    /// Turn one API read into an observation for the engine
    pub fn observe<T: RemoteObject>(
        &self,
        issued_at: Instant,
        result: Result<T>,
    ) -> Result<Observation<T>> {
        match result {
            Ok(object) => Ok(Observation::new(object.status().to_string(), object)),
            Err(err) if err.is_not_found() => self.on_not_found(issued_at, err),
            Err(err) => Err(err),
        }
    }

    fn on_not_found<T>(&self, issued_at: Instant, err: CloudError) -> Result<Observation<T>> {
        match self {
            NotFoundPolicy::Deleted => Ok(Observation::label(STATE_DELETED)),
            NotFoundPolicy::Grace(window) if issued_at.elapsed() < *window => {
                tracing::debug!(
                    "Not found {:.1?} after the request, still within the grace window",
                    issued_at.elapsed()
                );
                Ok(Observation::label(STATE_NOT_VISIBLE))
            }
            _ => Err(err),
        }
    }
}
