//! Remote object and request types
//!
//! These mirror the fields the control plane reports. Only what the
//! orchestrators and the state file need is modelled.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An object returned by the control plane that carries a state label
pub trait RemoteObject: Serialize + Send + Sync {
    fn id(&self) -> &str;

    /// State label used to classify the object while waiting
    fn status(&self) -> &str;
}

// ============================================================================
// Networking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default = "default_true")]
    pub admin_state_up: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl RemoteObject for Network {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNetworkOpts {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: String,
    #[serde(default)]
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
}

impl Port {
    /// Subnet of the port, when it has exactly one fixed IP
    pub fn single_subnet(&self) -> Option<&str> {
        match self.fixed_ips.as_slice() {
            [only] => Some(&only.subnet_id),
            _ => None,
        }
    }
}

impl RemoteObject for Port {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}

/// Response to attaching a subnet or port to a router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterInterface {
    /// Router ID
    pub id: String,
    pub subnet_id: String,
    pub port_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddInterfaceOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

impl AddInterfaceOpts {
    /// Exactly one of `subnet_id` and `port_id` must be given
    pub fn validate(&self) -> Result<()> {
        match (&self.subnet_id, &self.port_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (None, None) => Err(CloudError::InvalidConfig(
                "one of subnet_id or port_id is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(CloudError::InvalidConfig(
                "subnet_id and port_id are mutually exclusive".to_string(),
            )),
        }
    }
}

// ============================================================================
// Block storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAttachmentInfo {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub attachment_id: String,
    #[serde(default)]
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    pub size: u32,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub bootable: String,
    #[serde(default)]
    pub multiattach: bool,
    #[serde(default)]
    pub attachments: Vec<VolumeAttachmentInfo>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RemoteObject for Volume {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVolumeOpts {
    pub name: String,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub id: String,
    pub server_id: String,
    pub volume_id: String,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachVolumeOpts {
    pub server_id: String,
    pub volume_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Build the composite `volume_id/attachment_id` identifier
pub fn attachment_id(volume_id: &str, attachment_id: &str) -> String {
    format!("{}/{}", volume_id, attachment_id)
}

/// Split a composite `volume_id/attachment_id` identifier
pub fn parse_attachment_id(id: &str) -> Result<(String, String)> {
    match id.split_once('/') {
        Some((volume, attachment)) if !volume.is_empty() && !attachment.is_empty() => {
            Ok((volume.to_string(), attachment.to_string()))
        }
        _ => Err(CloudError::InvalidId(format!(
            "volume attachment ID '{}' is not in the form volume_id/attachment_id",
            id
        ))),
    }
}

// ============================================================================
// Load balancing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
    #[serde(default)]
    pub vip_address: String,
    #[serde(default)]
    pub vip_subnet_id: String,
}

impl RemoteObject for LoadBalancer {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.provisioning_status
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLoadBalancerOpts {
    pub name: String,
    pub vip_subnet_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
}

// ============================================================================
// Container infrastructure (Kubernetes clusters)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(alias = "uuid")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub node_count: u32,
    #[serde(default)]
    pub master_count: u32,
    #[serde(default)]
    pub cluster_template_id: String,
    #[serde(default)]
    pub api_address: Option<String>,
}

impl RemoteObject for Cluster {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateClusterOpts {
    pub name: String,
    pub cluster_template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

// ============================================================================
// Compute keypairs
// ============================================================================

/// Keypairs have no lifecycle on the API side; they exist or they don't.
pub const KEYPAIR_PRESENT: &str = "ACTIVE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypair {
    pub name: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl RemoteObject for Keypair {
    fn id(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &str {
        KEYPAIR_PRESENT
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateKeypairOpts {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

fn default_true() -> bool {
    true
}
