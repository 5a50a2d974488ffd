//! OpenStack control plane client
//!
//! Implements [`stratus_cloud::ControlPlane`] against the Networking,
//! Block Storage, Compute, Load Balancer and Container Infrastructure APIs.
//!
//! Authentication is out of scope: the client is handed a pre-issued token
//! and the endpoint of each service. There are no transport-level retries;
//! a failed request surfaces as a [`stratus_cloud::CloudError`] and the wait
//! engine decides what it means.
//!
//! | HTTP status | error                     |
//! |-------------|---------------------------|
//! | 404         | `CloudError::NotFound`    |
//! | 409         | `CloudError::Conflict`    |
//! | other 4xx/5xx | `CloudError::Api`       |
//! | connection failure | `CloudError::Transport` |

pub mod client;
pub mod control_plane;
pub mod endpoint;
pub mod error;

// Re-exports
pub use client::OpenStackClient;
pub use endpoint::{Endpoints, Service};
pub use error::{OpenStackError, Result};
