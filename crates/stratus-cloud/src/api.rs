//! Control plane contract
//!
//! The orchestrators talk to the remote API only through this trait.
//! Implementations must report an absent object as [`CloudError::NotFound`];
//! every wait relies on that distinction.
//!
//! [`CloudError::NotFound`]: crate::error::CloudError::NotFound

use crate::error::Result;
use crate::model::{
    AddInterfaceOpts, AttachVolumeOpts, Cluster, CreateClusterOpts, CreateKeypairOpts,
    CreateLoadBalancerOpts, CreateNetworkOpts, CreateVolumeOpts, Keypair, LoadBalancer, Network,
    Port, RouterInterface, Volume, VolumeAttachment,
};
use async_trait::async_trait;

/// Remote control plane client
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Returns the client name used in logs (e.g. "openstack")
    fn name(&self) -> &str;

    // Networking
    async fn create_network(&self, opts: &CreateNetworkOpts) -> Result<Network>;
    async fn get_network(&self, id: &str) -> Result<Network>;
    async fn delete_network(&self, id: &str) -> Result<()>;

    async fn add_router_interface(
        &self,
        router_id: &str,
        opts: &AddInterfaceOpts,
    ) -> Result<RouterInterface>;
    /// Detach the port from the router. A `Conflict` means the port is still in use.
    async fn remove_router_interface(&self, router_id: &str, port_id: &str) -> Result<()>;
    async fn get_port(&self, id: &str) -> Result<Port>;

    // Block storage
    async fn create_volume(&self, opts: &CreateVolumeOpts) -> Result<Volume>;
    async fn get_volume(&self, id: &str) -> Result<Volume>;
    async fn delete_volume(&self, id: &str) -> Result<()>;
    async fn attach_volume(&self, opts: &AttachVolumeOpts) -> Result<VolumeAttachment>;
    async fn detach_volume(&self, server_id: &str, attachment_id: &str) -> Result<()>;

    // Load balancing
    async fn create_loadbalancer(&self, opts: &CreateLoadBalancerOpts) -> Result<LoadBalancer>;
    async fn get_loadbalancer(&self, id: &str) -> Result<LoadBalancer>;
    async fn delete_loadbalancer(&self, id: &str, cascade: bool) -> Result<()>;

    // Container infrastructure
    /// Returns the new cluster's ID; the cluster itself is built asynchronously
    async fn create_cluster(&self, opts: &CreateClusterOpts) -> Result<String>;
    async fn get_cluster(&self, id: &str) -> Result<Cluster>;
    async fn resize_cluster(&self, id: &str, node_count: u32) -> Result<()>;
    async fn delete_cluster(&self, id: &str) -> Result<()>;

    // Compute keypairs
    async fn create_keypair(&self, opts: &CreateKeypairOpts) -> Result<Keypair>;
    async fn get_keypair(&self, name: &str) -> Result<Keypair>;
    async fn delete_keypair(&self, name: &str) -> Result<()>;
}
