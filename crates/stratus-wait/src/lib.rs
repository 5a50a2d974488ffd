//! Stratus state reconciliation engine
//!
//! Mutating calls against the control plane return before the remote object
//! is ready. This crate provides the one primitive every resource kind uses
//! to wait for convergence: repeatedly probe the object, classify the state
//! it reports against a [`WaitSpec`], and resolve to success or a typed
//! [`WaitError`].
//!
//! The engine knows nothing about resources. Callers decide what "not found"
//! means by mapping it to a label in their probe (for example `DELETED` when
//! waiting for a delete) or by letting it surface as [`WaitError::NotFound`].
//!
//! # Example
//!
//! ```ignore
//! use stratus_wait::{Observation, WaitSpec, wait};
//! use tokio_util::sync::CancellationToken;
//!
//! let spec = WaitSpec::new(["BUILD"], ["ACTIVE", "DOWN"])
//!     .subject(format!("port {}", port_id))
//!     .timeout(Duration::from_secs(600));
//!
//! let converged = wait(&spec, &CancellationToken::new(), || async {
//!     let port = client.get_port(&port_id).await?;
//!     Ok(Observation::new(port.status.clone(), port))
//! })
//! .await?;
//! ```

pub mod engine;
pub mod error;
pub mod probe;
pub mod spec;

// Re-exports
pub use engine::{wait, wait_for_state};
pub use error::{BoxError, WaitError, WaitErrorKind};
pub use probe::{Converged, Observation, ProbeError};
pub use spec::{SpecError, WaitSpec};
pub use tokio_util::sync::CancellationToken;
