use super::{issue_delete, untracked_delete};
use crate::api::ControlPlane;
use crate::error::Result;
use crate::model::{CreateNetworkOpts, Network};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

const KIND: ResourceKind = ResourceKind::Network;

impl<C: ControlPlane> Provisioner<C> {
    /// Create a network and wait until it is `ACTIVE` or `DOWN`
    pub async fn create_network(
        &self,
        opts: &CreateNetworkOpts,
        record: &mut ResourceState,
    ) -> Result<Network> {
        let issued_at = Instant::now();
        let created = self.client().create_network(opts).await?;
        tracing::info!("Created network {} ({})", created.id, opts.name);

        record.observe(&created)?;
        record.set_status(ResourceStatus::Creating);

        let id = created.id.clone();
        let spec = self.wait_spec(KIND, Operation::Create, &id, &["BUILD"], &["ACTIVE", "DOWN"]);
        let network = self
            .converge(
                Operation::Create,
                KIND,
                &id,
                record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_network(&id),
            )
            .await?;

        Ok(network.unwrap_or(created))
    }

    pub async fn read_network(&self, record: &mut ResourceState) -> Result<Network> {
        let id = record.require_id()?;
        self.refresh(KIND, record, self.client().get_network(&id))
            .await
    }

    /// Delete a network and wait until it is gone
    pub async fn delete_network(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(KIND, record) {
            return Ok(());
        }
        let id = record.id.clone();

        let issued_at = Instant::now();
        if !issue_delete(KIND, record, self.client().delete_network(&id)).await? {
            return Ok(());
        }

        let spec = self.wait_spec(
            KIND,
            Operation::Delete,
            &id,
            &["ACTIVE", "DOWN"],
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
            || self.client().get_network(&id),
        )
        .await?;

        Ok(())
    }
}
