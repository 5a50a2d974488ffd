use super::{issue_delete, untracked_delete};
use crate::api::ControlPlane;
use crate::error::Result;
use crate::model::{CreateLoadBalancerOpts, LoadBalancer};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

const KIND: ResourceKind = ResourceKind::LoadBalancer;

impl<C: ControlPlane> Provisioner<C> {
    /// Create a load balancer and wait for its provisioning status to become `ACTIVE`
    pub async fn create_loadbalancer(
        &self,
        opts: &CreateLoadBalancerOpts,
        record: &mut ResourceState,
    ) -> Result<LoadBalancer> {
        let issued_at = Instant::now();
        let created = self.client().create_loadbalancer(opts).await?;
        tracing::info!("Created load balancer {} ({})", created.id, opts.name);

        record.observe(&created)?;
        record.set_status(ResourceStatus::Creating);

        let id = created.id.clone();
        let spec = self.wait_spec(
            KIND,
            Operation::Create,
            &id,
            &["PENDING_CREATE", "PENDING_UPDATE"],
            &["ACTIVE"],
        );
        let lb = self
            .converge(
                Operation::Create,
                KIND,
                &id,
                record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_loadbalancer(&id),
            )
            .await?;

        Ok(lb.unwrap_or(created))
    }

    pub async fn read_loadbalancer(&self, record: &mut ResourceState) -> Result<LoadBalancer> {
        let id = record.require_id()?;
        self.refresh(KIND, record, self.client().get_loadbalancer(&id))
            .await
    }

    /// Delete a load balancer. With `cascade` its listeners and pools go with it.
    pub async fn delete_loadbalancer(
        &self,
        record: &mut ResourceState,
        cascade: bool,
    ) -> Result<()> {
        if untracked_delete(KIND, record) {
            return Ok(());
        }
        let id = record.id.clone();

        let issued_at = Instant::now();
        let call = self.client().delete_loadbalancer(&id, cascade);
        if !issue_delete(KIND, record, call).await? {
            return Ok(());
        }

        let spec = self.wait_spec(
            KIND,
            Operation::Delete,
            &id,
            &["ACTIVE", "PENDING_DELETE"],
            &[STATE_DELETED],
        );
        self.converge(
            Operation::Delete,
            KIND,
            &id,
            record,
            spec,
            NotFoundPolicy::Deleted,
            issued_at,
            || self.client().get_loadbalancer(&id),
        )
        .await?;

        Ok(())
    }
}
