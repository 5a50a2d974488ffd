//! Per-kind orchestrators
//!
//! Each module adds `create_*`, `read_*` and `delete_*` methods to
//! [`Provisioner`](crate::provisioner::Provisioner). Every method takes the
//! resource's [`ResourceState`] record and leaves it describing what is
//! known about the remote object when it returns, whether it succeeded or not.

mod cluster;
mod keypair;
mod loadbalancer;
mod network;
mod router_interface;
mod volume;

use crate::error::Result;
use crate::operation::ResourceKind;
use crate::state::{ResourceState, ResourceStatus};
use std::future::Future;

/// Issue a delete call. Returns `false` when the object was already gone,
/// in which case the record has been cleared and there is nothing to wait for.
pub(crate) async fn issue_delete<Fut>(
    kind: ResourceKind,
    record: &mut ResourceState,
    call: Fut,
) -> Result<bool>
where
    Fut: Future<Output = Result<()>>,
{
    match call.await {
        Ok(()) => {
            tracing::info!("Deleting {} {}", kind.display_name(), record.id);
            record.set_status(ResourceStatus::Deleting);
            Ok(true)
        }
        Err(err) if err.is_not_found() => {
            tracing::info!("{} {} is already gone", kind.display_name(), record.id);
            record.clear();
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Nothing recorded, nothing to delete
pub(crate) fn untracked_delete(kind: ResourceKind, record: &ResourceState) -> bool {
    if record.is_tracked() {
        return false;
    }
    tracing::debug!("{} has no recorded ID, skipping delete", kind.display_name());
    true
}
