//! Router interfaces
//!
//! The recorded ID is the interface's port ID; the router is kept in the
//! `router_id` attribute. Both mutations hold the router's key lock for the
//! whole mutate+wait sequence.

use super::untracked_delete;
use crate::api::ControlPlane;
use crate::error::{CloudError, Result};
use crate::model::{AddInterfaceOpts, Port};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

const KIND: ResourceKind = ResourceKind::RouterInterface;

impl<C: ControlPlane> Provisioner<C> {
    /// Attach a subnet or port to a router and wait for the port to come up
    pub async fn create_router_interface(
        &self,
        router_id: &str,
        opts: &AddInterfaceOpts,
        record: &mut ResourceState,
    ) -> Result<Port> {
        opts.validate()?;
        let _guard = self.locks().lock(router_id).await;

        let issued_at = Instant::now();
        let interface = self.client().add_router_interface(router_id, opts).await?;
        tracing::info!(
            "Added interface {} (subnet {}) to router {}",
            interface.port_id,
            interface.subnet_id,
            router_id
        );

        record.id = interface.port_id.clone();
        record.set_status(ResourceStatus::Creating);
        annotate(record, router_id, Some(&interface.subnet_id));

        let port_id = interface.port_id.clone();
        let spec = self.wait_spec(
            KIND,
            Operation::Create,
            &port_id,
            &["BUILD", "PENDING_CREATE", "PENDING_UPDATE"],
            &["ACTIVE", "DOWN"],
        );
        let result = self
            .converge(
                Operation::Create,
                KIND,
                &port_id,
                record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_port(&port_id),
            )
            .await;

        // Observing the port replaces the attributes
        if record.is_tracked() {
            annotate(record, router_id, Some(&interface.subnet_id));
        }

        match result? {
            Some(port) => Ok(port),
            None => self.client().get_port(&port_id).await,
        }
    }

    pub async fn read_router_interface(&self, record: &mut ResourceState) -> Result<Port> {
        let port_id = record.require_id()?;
        let port = self
            .refresh(KIND, record, self.client().get_port(&port_id))
            .await?;

        let subnet = port.single_subnet();
        if subnet.is_none() {
            tracing::debug!("Unable to determine the subnet of router interface {}", port_id);
        }
        annotate(record, &port.device_id, subnet);
        Ok(port)
    }

    /// Detach the port from its router.
    ///
    /// The removal is re-issued on every probe until the port is gone: the
    /// API refuses it with a conflict while the port is still in use.
    pub async fn delete_router_interface(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(KIND, record) {
            return Ok(());
        }
        let port_id = record.id.clone();
        let router_id: String = record.get_attribute("router_id").ok_or_else(|| {
            CloudError::InvalidId(format!(
                "router interface {} has no recorded router_id",
                port_id
            ))
        })?;

        let _guard = self.locks().lock(&router_id).await;
        record.set_status(ResourceStatus::Deleting);

        let spec = self.wait_spec(
            KIND,
            Operation::Delete,
            &port_id,
            &["ACTIVE", "DOWN"],
            &[STATE_DELETED],
        );

        let issued_at = Instant::now();
        let this = self;
        let (router, port) = (&router_id, &port_id);
        let result = self
            .converge(
                Operation::Delete,
                KIND,
                &port_id,
                record,
                spec,
                NotFoundPolicy::Deleted,
                issued_at,
                move || async move {
                    match this.client().remove_router_interface(router, port).await {
                        Ok(()) => tracing::debug!("Removed port {} from router {}", port, router),
                        Err(err) if err.is_conflict() => {
                            tracing::debug!("Port {} is still in use: {}", port, err)
                        }
                        Err(err) if err.is_not_found() => {}
                        Err(err) => return Err(err),
                    }
                    this.client().get_port(port).await
                },
            )
            .await;

        if record.is_tracked() {
            annotate(record, &router_id, None);
        }
        result.map(|_| ())
    }
}

fn annotate(record: &mut ResourceState, router_id: &str, subnet_id: Option<&str>) {
    record.set_attribute("router_id", serde_json::json!(router_id));
    if let Some(subnet_id) = subnet_id.filter(|s| !s.is_empty()) {
        record.set_attribute("subnet_id", serde_json::json!(subnet_id));
    }
}
