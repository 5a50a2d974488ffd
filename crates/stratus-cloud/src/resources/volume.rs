//! Volumes and volume attachments
//!
//! Attachments have no lifecycle of their own: their progress is read from
//! the volume's status. They are recorded under the composite ID
//! `volume_id/attachment_id` and hold the volume's key lock while attaching
//! or detaching. A multiattach volume stays `in-use` after one of its
//! attachments is removed, so detaching also watches the attachment list.

use super::{issue_delete, untracked_delete};
use crate::api::ControlPlane;
use crate::error::{CloudError, Result};
use crate::model::{
    AttachVolumeOpts, CreateVolumeOpts, Volume, VolumeAttachment, attachment_id,
    parse_attachment_id,
};
use crate::operation::{Operation, ResourceKind};
use crate::policy::{NotFoundPolicy, STATE_DELETED};
use crate::provisioner::Provisioner;
use crate::state::{ResourceState, ResourceStatus};
use tokio::time::Instant;

/// Synthetic target label for "still in use, but not by this attachment"
const STATE_DETACHED: &str = "DETACHED";

impl<C: ControlPlane> Provisioner<C> {
    /// Create a volume and wait until it is `available`
    pub async fn create_volume(
        &self,
        opts: &CreateVolumeOpts,
        record: &mut ResourceState,
    ) -> Result<Volume> {
        let issued_at = Instant::now();
        let created = self.client().create_volume(opts).await?;
        tracing::info!("Created volume {} ({} GB)", created.id, opts.size);

        record.observe(&created)?;
        record.set_status(ResourceStatus::Creating);

        let id = created.id.clone();
        let spec = self.wait_spec(
            ResourceKind::Volume,
            Operation::Create,
            &id,
            &["downloading", "creating"],
            &["available"],
        );
        let volume = self
            .converge(
                Operation::Create,
                ResourceKind::Volume,
                &id,
                record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_volume(&id),
            )
            .await?;

        Ok(volume.unwrap_or(created))
    }

    pub async fn read_volume(&self, record: &mut ResourceState) -> Result<Volume> {
        let id = record.require_id()?;
        self.refresh(ResourceKind::Volume, record, self.client().get_volume(&id))
            .await
    }

    pub async fn delete_volume(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(ResourceKind::Volume, record) {
            return Ok(());
        }
        let id = record.id.clone();

        let issued_at = Instant::now();
        let call = self.client().delete_volume(&id);
        if !issue_delete(ResourceKind::Volume, record, call).await? {
            return Ok(());
        }

        let spec = self.wait_spec(
            ResourceKind::Volume,
            Operation::Delete,
            &id,
            &["deleting", "downloading", "available"],
            &[STATE_DELETED],
        );
        self.converge(
            Operation::Delete,
            ResourceKind::Volume,
            &id,
            record,
            spec,
            NotFoundPolicy::Deleted,
            issued_at,
            || self.client().get_volume(&id),
        )
        .await?;

        Ok(())
    }

    /// Attach a volume to a server and wait until the volume is `in-use`
    pub async fn attach_volume(
        &self,
        opts: &AttachVolumeOpts,
        record: &mut ResourceState,
    ) -> Result<VolumeAttachment> {
        let volume_id = opts.volume_id.as_str();
        let _guard = self.locks().lock(volume_id).await;

        let issued_at = Instant::now();
        let attachment = self.client().attach_volume(opts).await?;
        let id = attachment_id(volume_id, &attachment.id);
        tracing::info!("Attaching volume {} to server {} ({})", volume_id, opts.server_id, id);

        record.id = id.clone();
        record.absorb(&attachment)?;
        record.set_status(ResourceStatus::Creating);

        let mut volume_record = ResourceState::new(volume_id, ResourceKind::Volume)
            .with_status(ResourceStatus::Creating);
        let spec = self.wait_spec(
            ResourceKind::VolumeAttach,
            Operation::Create,
            &id,
            &["available", "attaching"],
            &["in-use"],
        );
        let result = self
            .converge(
                Operation::Create,
                ResourceKind::VolumeAttach,
                &id,
                &mut volume_record,
                spec,
                self.create_policy(),
                issued_at,
                || self.client().get_volume(volume_id),
            )
            .await;

        carry_over(record, &volume_record);
        result?;
        Ok(attachment)
    }

    /// Refresh an attachment from its volume's attachment list
    pub async fn read_volume_attach(
        &self,
        record: &mut ResourceState,
    ) -> Result<VolumeAttachment> {
        let id = record.require_id()?;
        let (volume_id, attachment) = parse_attachment_id(&id)?;

        let volume = match self.client().get_volume(&volume_id).await {
            Ok(volume) => volume,
            Err(err) if err.is_not_found() => return Err(gone(record, id)),
            Err(err) => return Err(err),
        };

        let Some(info) = volume
            .attachments
            .iter()
            .find(|a| a.attachment_id == attachment)
        else {
            tracing::warn!("Volume {} no longer has attachment {}", volume_id, attachment);
            return Err(gone(record, id));
        };

        let current = VolumeAttachment {
            id: attachment.clone(),
            server_id: info.server_id.clone(),
            volume_id: volume_id.clone(),
            device: Some(info.device.clone()).filter(|d| !d.is_empty()),
        };
        record.absorb(&current)?;
        record.remote_state = Some(volume.status.clone());
        Ok(current)
    }

    /// Detach a volume and wait until it is `available` again
    pub async fn detach_volume(&self, record: &mut ResourceState) -> Result<()> {
        if untracked_delete(ResourceKind::VolumeAttach, record) {
            return Ok(());
        }
        let id = record.id.clone();
        let (volume_id, attachment) = parse_attachment_id(&id)?;
        let server_id: String = record.get_attribute("server_id").ok_or_else(|| {
            CloudError::InvalidId(format!("volume attachment {} has no recorded server_id", id))
        })?;

        let _guard = self.locks().lock(&volume_id).await;

        let issued_at = Instant::now();
        let call = self.client().detach_volume(&server_id, &attachment);
        if !issue_delete(ResourceKind::VolumeAttach, record, call).await? {
            return Ok(());
        }

        let mut volume_record = ResourceState::new(volume_id.as_str(), ResourceKind::Volume)
            .with_status(ResourceStatus::Deleting);
        let spec = self.wait_spec(
            ResourceKind::VolumeAttach,
            Operation::Delete,
            &id,
            &["in-use", "detaching"],
            &["available", STATE_DETACHED],
        );
        let result = self
            .converge(
                Operation::Delete,
                ResourceKind::VolumeAttach,
                &id,
                &mut volume_record,
                spec,
                NotFoundPolicy::Deleted,
                issued_at,
                || self.detaching_volume(&volume_id, &attachment),
            )
            .await;

        carry_over(record, &volume_record);
        result.map(|_| ())
    }

    /// Read the volume, reporting it detached once the attachment is no longer listed
    async fn detaching_volume(&self, volume_id: &str, attachment: &str) -> Result<Volume> {
        let mut volume = self.client().get_volume(volume_id).await?;
        let listed = volume
            .attachments
            .iter()
            .any(|a| a.attachment_id == attachment);
        if volume.status == "in-use" && !listed {
            volume.status = STATE_DETACHED.to_string();
        }
        Ok(volume)
    }
}

/// Copy the outcome of a wait on the volume onto the attachment record
fn carry_over(record: &mut ResourceState, volume: &ResourceState) {
    if !volume.is_tracked() {
        record.clear();
        return;
    }
    record.remote_state = volume.remote_state.clone();
    record.set_status(volume.status);
}

fn gone(record: &mut ResourceState, id: String) -> CloudError {
    record.clear();
    CloudError::Gone {
        operation: Operation::Read,
        kind: ResourceKind::VolumeAttach,
        id,
    }
}
