//! Keypairs complete synchronously. They still go through a single probe so
//! that errors and state recording follow the same rules as other kinds.

use super::{issue_delete, untracked_delete};
use crate::api::ControlPlane;
use crate::error::Result;
use crate::model::{CreateKeypairOpts, KEYPAIR_PRESENT, Keypair};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

const KIND: ResourceKind = ResourceKind::Keypair;

impl<C: ControlPlane> Provisioner<C> {
    pub async fn create_keypair(
        &self,
        opts: &CreateKeypairOpts,
        record: &mut ResourceState,
    ) -> Result<Keypair> {
        let issued_at = Instant::now();
        let created = self.client().create_keypair(opts).await?;
        tracing::info!("Created keypair {}", created.name);

        record.observe(&created)?;
        record.set_status(ResourceStatus::Creating);

        let name = created.name.clone();
        let spec = self.wait_spec(KIND, Operation::Create, &name, &[], &[KEYPAIR_PRESENT]);
        let keypair = self
            .converge(
                Operation::Create,
                KIND,
                &name,
                record,
                spec,
                NotFoundPolicy::Fatal,
                issued_at,
                || self.client().get_keypair(&name),
            )
            .await?;

        // Only the create response carries a generated private key
        Ok(match keypair {
            Some(found) if created.private_key.is_none() => found,
            _ => created,
        })
    }

    pub async fn read_keypair(&self, record: &mut ResourceState) -> Result<Keypair> {
        let name = record.require_id()?;
        self.refresh(KIND, record, self.client().get_keypair(&name))
            .await
    }

    pub async fn delete_keypair(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(KIND, record) {
            return Ok(());
        }
        let name = record.id.clone();

        let issued_at = Instant::now();
        if !issue_delete(KIND, record, self.client().delete_keypair(&name)).await? {
            return Ok(());
        }

        let spec = self.wait_spec(KIND, Operation::Delete, &name, &[], &[STATE_DELETED]);
        self.converge(
            Operation::Delete,
            KIND,
            &name,
            record,
            spec,
            NotFoundPolicy::Deleted,
            issued_at,
            || self.client().get_keypair(&name),
        )
        .await?;

        Ok(())
    }
}
