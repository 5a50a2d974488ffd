//! Stratus cloud resource orchestration
//!
//! Every create, update and delete against the control plane follows the same
//! shape: issue the mutating call, wait for the remote object to converge with
//! [`stratus_wait`], then record what was observed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  stratus CLI                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                stratus-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Provisioner (per-kind orchestrators)    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌─────────────┐ ┌──────────┐  │
//! │  │ NotFound     │ │ KeyedLock   │ │  State   │  │
//! │  │ policy       │ │             │ │  Mgmt    │  │
//! │  └──────────────┘ └─────────────┘ └──────────┘  │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ stratus-wait  │ │ ControlPlane  │
//! │   (engine)    │ │ (openstack)   │
//! └───────────────┘ └───────────────┘
//! ```

pub mod api;
pub mod error;
pub mod lock;
pub mod model;
pub mod operation;
mod outcome;
pub mod policy;
pub mod provisioner;
mod resources;
pub mod state;

// Re-exports
pub use api::ControlPlane;
pub use error::{CloudError, Result};
pub use lock::{KeyGuard, KeyedLock};
pub use model::RemoteObject;
pub use operation::{Operation, ResourceKind};
pub use policy::{NotFoundPolicy, STATE_DELETED, STATE_NOT_VISIBLE};
pub use provisioner::{ProvisionSettings, Provisioner, Timeouts};
pub use state::{GlobalState, ResourceState, ResourceStatus, StateLock, StateManager};
