use super::Session;
use colored::Colorize;
use std::path::Path;
use stratus_cloud::{GlobalState, ResourceKind};
use stratus_config::Settings;

pub async fn handle(
    settings: &Settings,
    project_root: &Path,
    kind: ResourceKind,
    name: &str,
    cascade: bool,
) -> anyhow::Result<()> {
    if cascade && kind != ResourceKind::LoadBalancer {
        tracing::warn!("--cascade only applies to load balancers, ignoring it");
    }
    let provisioner = super::provisioner(settings)?;

    let address = GlobalState::address(kind, name);
    let session = Session::open(project_root).await?;
    let mut record = session.record(kind, &address);
    if !record.is_tracked() {
        println!("{} is not recorded in state, nothing to delete", address.yellow());
        return session.commit(address, record).await;
    }

    println!("{} {} ({})", "Deleting".cyan(), address.bold(), record.id);

    let result = match kind {
        ResourceKind::Network => provisioner.delete_network(&mut record).await,
        ResourceKind::RouterInterface => provisioner.delete_router_interface(&mut record).await,
        ResourceKind::Volume => provisioner.delete_volume(&mut record).await,
        ResourceKind::VolumeAttach => provisioner.detach_volume(&mut record).await,
        ResourceKind::LoadBalancer => provisioner.delete_loadbalancer(&mut record, cascade).await,
        ResourceKind::Cluster => provisioner.delete_cluster(&mut record).await,
        ResourceKind::Keypair => provisioner.delete_keypair(&mut record).await,
    };

    session.commit(address.clone(), record).await?;
    result?;

    println!("{} {}", "✓ Deleted".green(), address.bold());
    Ok(())
}
