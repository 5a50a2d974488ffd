//! `ControlPlane` over the OpenStack REST APIs

use crate::client::OpenStackClient;
use crate::endpoint::Service;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use stratus_cloud::model::{
    AddInterfaceOpts, AttachVolumeOpts, Cluster, CreateClusterOpts, CreateKeypairOpts,
    CreateLoadBalancerOpts, CreateNetworkOpts, CreateVolumeOpts, Keypair, LoadBalancer, Network,
    Port, RouterInterface, Volume, VolumeAttachment,
};
use stratus_cloud::{ControlPlane, Result};

/// Compute's attachment record uses camelCase
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerVolumeAttachment {
    id: String,
    server_id: String,
    volume_id: String,
    #[serde(default)]
    device: Option<String>,
}

impl From<ServerVolumeAttachment> for VolumeAttachment {
    fn from(attachment: ServerVolumeAttachment) -> Self {
        Self {
            id: attachment.id,
            server_id: attachment.server_id,
            volume_id: attachment.volume_id,
            device: attachment.device,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClusterCreated {
    uuid: String,
}

#[async_trait]
impl ControlPlane for OpenStackClient {
    fn name(&self) -> &str {
        "openstack"
    }

    // ------------------------------------------------------------------
    // Networking (neutron)
    // ------------------------------------------------------------------

    async fn create_network(&self, opts: &CreateNetworkOpts) -> Result<Network> {
        let body = json!({ "network": opts });
        self.call(Method::POST, Service::Network, "v2.0/networks", Some(&body), Some("network"))
            .await
    }

    async fn get_network(&self, id: &str) -> Result<Network> {
        let path = format!("v2.0/networks/{}", id);
        self.call(Method::GET, Service::Network, &path, None, Some("network"))
            .await
    }

    async fn delete_network(&self, id: &str) -> Result<()> {
        let path = format!("v2.0/networks/{}", id);
        self.call_empty(Method::DELETE, Service::Network, &path, None)
            .await
    }

    async fn add_router_interface(
        &self,
        router_id: &str,
        opts: &AddInterfaceOpts,
    ) -> Result<RouterInterface> {
        opts.validate()?;
        let path = format!("v2.0/routers/{}/add_router_interface", router_id);
        let body = serde_json::to_value(opts)?;
        self.call(Method::PUT, Service::Network, &path, Some(&body), None)
            .await
    }

    async fn remove_router_interface(&self, router_id: &str, port_id: &str) -> Result<()> {
        let path = format!("v2.0/routers/{}/remove_router_interface", router_id);
        let body = json!({ "port_id": port_id });
        self.call_empty(Method::PUT, Service::Network, &path, Some(&body))
            .await
    }

    async fn get_port(&self, id: &str) -> Result<Port> {
        let path = format!("v2.0/ports/{}", id);
        self.call(Method::GET, Service::Network, &path, None, Some("port"))
            .await
    }

    // ------------------------------------------------------------------
    // Block storage (cinder) and server attachments (nova)
    // ------------------------------------------------------------------

    async fn create_volume(&self, opts: &CreateVolumeOpts) -> Result<Volume> {
        let body = json!({ "volume": opts });
        self.call(Method::POST, Service::BlockStorage, "volumes", Some(&body), Some("volume"))
            .await
    }

    async fn get_volume(&self, id: &str) -> Result<Volume> {
        let path = format!("volumes/{}", id);
        self.call(Method::GET, Service::BlockStorage, &path, None, Some("volume"))
            .await
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        let path = format!("volumes/{}", id);
        self.call_empty(Method::DELETE, Service::BlockStorage, &path, None)
            .await
    }

    async fn attach_volume(&self, opts: &AttachVolumeOpts) -> Result<VolumeAttachment> {
        let path = format!("servers/{}/os-volume_attachments", opts.server_id);
        let mut attachment = json!({ "volumeId": opts.volume_id });
        if let Some(device) = &opts.device {
            attachment["device"] = Value::String(device.clone());
        }
        let body = json!({ "volumeAttachment": attachment });

        let created: ServerVolumeAttachment = self
            .call(
                Method::POST,
                Service::Compute,
                &path,
                Some(&body),
                Some("volumeAttachment"),
            )
            .await?;
        Ok(created.into())
    }

    async fn detach_volume(&self, server_id: &str, attachment_id: &str) -> Result<()> {
        let path = format!("servers/{}/os-volume_attachments/{}", server_id, attachment_id);
        self.call_empty(Method::DELETE, Service::Compute, &path, None)
            .await
    }

    // ------------------------------------------------------------------
    // Load balancing (octavia)
    // ------------------------------------------------------------------

    async fn create_loadbalancer(&self, opts: &CreateLoadBalancerOpts) -> Result<LoadBalancer> {
        let body = json!({ "loadbalancer": opts });
        self.call(
            Method::POST,
            Service::LoadBalancer,
            "v2/lbaas/loadbalancers",
            Some(&body),
            Some("loadbalancer"),
        )
        .await
    }

    async fn get_loadbalancer(&self, id: &str) -> Result<LoadBalancer> {
        let path = format!("v2/lbaas/loadbalancers/{}", id);
        self.call(Method::GET, Service::LoadBalancer, &path, None, Some("loadbalancer"))
            .await
    }

    async fn delete_loadbalancer(&self, id: &str, cascade: bool) -> Result<()> {
        let path = if cascade {
            format!("v2/lbaas/loadbalancers/{}?cascade=true", id)
        } else {
            format!("v2/lbaas/loadbalancers/{}", id)
        };
        self.call_empty(Method::DELETE, Service::LoadBalancer, &path, None)
            .await
    }

    // ------------------------------------------------------------------
    // Container infrastructure (magnum)
    // ------------------------------------------------------------------

    async fn create_cluster(&self, opts: &CreateClusterOpts) -> Result<String> {
        let body = serde_json::to_value(opts)?;
        let created: ClusterCreated = self
            .call(Method::POST, Service::ContainerInfra, "v1/clusters", Some(&body), None)
            .await?;
        Ok(created.uuid)
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let path = format!("v1/clusters/{}", id);
        self.call(Method::GET, Service::ContainerInfra, &path, None, None)
            .await
    }

    async fn resize_cluster(&self, id: &str, node_count: u32) -> Result<()> {
        let path = format!("v1/clusters/{}", id);
        let body = json!([{ "op": "replace", "path": "/node_count", "value": node_count }]);
        self.call_empty(Method::PATCH, Service::ContainerInfra, &path, Some(&body))
            .await
    }

    async fn delete_cluster(&self, id: &str) -> Result<()> {
        let path = format!("v1/clusters/{}", id);
        self.call_empty(Method::DELETE, Service::ContainerInfra, &path, None)
            .await
    }

    // ------------------------------------------------------------------
    // Keypairs (nova)
    // ------------------------------------------------------------------

    async fn create_keypair(&self, opts: &CreateKeypairOpts) -> Result<Keypair> {
        let body = json!({ "keypair": opts });
        self.call(Method::POST, Service::Compute, "os-keypairs", Some(&body), Some("keypair"))
            .await
    }

    async fn get_keypair(&self, name: &str) -> Result<Keypair> {
        let path = format!("os-keypairs/{}", name);
        self.call(Method::GET, Service::Compute, &path, None, Some("keypair"))
            .await
    }

    async fn delete_keypair(&self, name: &str) -> Result<()> {
        let path = format!("os-keypairs/{}", name);
        self.call_empty(Method::DELETE, Service::Compute, &path, None)
            .await
    }
}
