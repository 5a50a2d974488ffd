//! Operation and resource kind identifiers

use crate::error::CloudError;
use crate::state::ResourceStatus;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle operation an orchestrator performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create a new resource
    Create,
    /// Refresh the recorded attributes of an existing resource
    Read,
    /// Update an existing resource in place
    Update,
    /// Delete a resource
    Delete,
}

impl Operation {
    /// Status recorded while the operation is still converging
    pub fn in_progress_status(&self) -> ResourceStatus {
        match self {
            Operation::Create => ResourceStatus::Creating,
            Operation::Update => ResourceStatus::Updating,
            Operation::Delete => ResourceStatus::Deleting,
            Operation::Read => ResourceStatus::Unknown,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Resource kinds managed by the provisioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    RouterInterface,
    Volume,
    VolumeAttach,
    LoadBalancer,
    Cluster,
    Keypair,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Network,
        ResourceKind::RouterInterface,
        ResourceKind::Volume,
        ResourceKind::VolumeAttach,
        ResourceKind::LoadBalancer,
        ResourceKind::Cluster,
        ResourceKind::Keypair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::RouterInterface => "router_interface",
            ResourceKind::Volume => "volume",
            ResourceKind::VolumeAttach => "volume_attach",
            ResourceKind::LoadBalancer => "loadbalancer",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Keypair => "keypair",
        }
    }

    /// Human readable name used in diagnostics
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::RouterInterface => "router interface",
            ResourceKind::Volume => "volume",
            ResourceKind::VolumeAttach => "volume attachment",
            ResourceKind::LoadBalancer => "load balancer",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Keypair => "keypair",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CloudError::InvalidConfig(format!("unknown resource kind: {}", s)))
    }
}
