//! Kubernetes clusters
//!
//! The create call only returns the new cluster's ID, so the record starts
//! without attributes until the first probe comes back.
//!
//! Right after an update or delete is accepted the cluster may still report
//! the stable state it was in before, so those waits treat it as pending.

use super::{issue_delete, untracked_delete};
use crate::api::ControlPlane;
use crate::error::Result;
use crate::model::{Cluster, CreateClusterOpts};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

const KIND: ResourceKind = ResourceKind::Cluster;

/// Synthetic pending label for a completed cluster that does not have the
/// requested node count yet
const STATE_RESIZE_PENDING: &str = "RESIZE_PENDING";

impl<C: ControlPlane> Provisioner<C> {
    pub async fn create_cluster(
        &self,
        opts: &CreateClusterOpts,
        record: &mut ResourceState,
    ) -> Result<Cluster> {
        let issued_at = Instant::now();
        let id = self.client().create_cluster(opts).await?;
        tracing::info!("Requested cluster {} ({})", id, opts.name);

        record.id = id.clone();
        record.set_status(ResourceStatus::Creating);

        let spec = self.wait_spec(
            KIND,
            Operation::Create,
            &id,
            &["CREATE_IN_PROGRESS"],
            &["CREATE_COMPLETE"],
        );
        let cluster = self
            .converge(
                Operation::Create,
                KIND,
                &id,
                record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_cluster(&id),
            )
            .await?;

        match cluster {
            Some(cluster) => Ok(cluster),
            None => self.client().get_cluster(&id).await,
        }
    }

    pub async fn read_cluster(&self, record: &mut ResourceState) -> Result<Cluster> {
        let id = record.require_id()?;
        self.refresh(KIND, record, self.client().get_cluster(&id))
            .await
    }

    /// Change the number of worker nodes and wait for the update to finish
    pub async fn resize_cluster(
        &self,
        record: &mut ResourceState,
        node_count: u32,
    ) -> Result<Cluster> {
        let id = record.require_id()?;
        let _guard = self.locks().lock(&id).await;

        let issued_at = Instant::now();
        self.client().resize_cluster(&id, node_count).await?;
        tracing::info!("Resizing cluster {} to {} nodes", id, node_count);
        record.set_status(ResourceStatus::Updating);

        let spec = self.wait_spec(
            KIND,
            Operation::Update,
            &id,
            &["CREATE_COMPLETE", STATE_RESIZE_PENDING, "UPDATE_IN_PROGRESS"],
            &["UPDATE_COMPLETE"],
        );
        let cluster = self
            .converge(
                Operation::Update,
                KIND,
                &id,
                record,
                spec,
                NotFoundPolicy::Fatal,
                issued_at,
                || self.resized_cluster(&id, node_count),
            )
            .await?;

        match cluster {
            Some(cluster) => Ok(cluster),
            None => self.client().get_cluster(&id).await,
        }
    }

    pub async fn delete_cluster(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(KIND, record) {
            return Ok(());
        }
        let id = record.id.clone();

        let issued_at = Instant::now();
        if !issue_delete(KIND, record, self.client().delete_cluster(&id)).await? {
            return Ok(());
        }

        let spec = self.wait_spec(
            KIND,
            Operation::Delete,
            &id,
            &["CREATE_COMPLETE", "UPDATE_COMPLETE", "DELETE_IN_PROGRESS"],
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
            || self.client().get_cluster(&id),
        )
        .await?;

        Ok(())
    }

    /// Read the cluster, holding back `UPDATE_COMPLETE` until the node count matches
    async fn resized_cluster(&self, id: &str, node_count: u32) -> Result<Cluster> {
        let mut cluster = self.client().get_cluster(id).await?;
        if cluster.status == "UPDATE_COMPLETE" && cluster.node_count != node_count {
            tracing::debug!(
                "Cluster {} reports {} nodes, waiting for {}",
                id,
                cluster.node_count,
                node_count
            );
            cluster.status = STATE_RESIZE_PENDING.to_string();
        }
        Ok(cluster)
    }
}
