use super::Session;
use anyhow::bail;
use colored::Colorize;
use std::path::Path;
use stratus_cloud::{CloudError, GlobalState, ResourceKind};
use stratus_config::Settings;

pub async fn handle(
    settings: &Settings,
    project_root: &Path,
    kind: ResourceKind,
    name: &str,
) -> anyhow::Result<()> {
    let provisioner = super::provisioner(settings)?;

    let address = GlobalState::address(kind, name);
    let session = Session::open(project_root).await?;
    let mut record = session.record(kind, &address);
    if !record.is_tracked() {
        session.commit(address.clone(), record).await?;
        bail!("{} not found in state", address);
    }

    let result = match kind {
        ResourceKind::Network => provisioner.read_network(&mut record).await.map(drop),
        ResourceKind::RouterInterface => {
            provisioner.read_router_interface(&mut record).await.map(drop)
        }
        ResourceKind::Volume => provisioner.read_volume(&mut record).await.map(drop),
        ResourceKind::VolumeAttach => provisioner.read_volume_attach(&mut record).await.map(drop),
        ResourceKind::LoadBalancer => provisioner.read_loadbalancer(&mut record).await.map(drop),
        ResourceKind::Cluster => provisioner.read_cluster(&mut record).await.map(drop),
        ResourceKind::Keypair => provisioner.read_keypair(&mut record).await.map(drop),
    };

    let remote_state = record.remote_state.clone();
    session.commit(address.clone(), record).await?;

    match result {
        Ok(()) => {
            println!(
                "{} {} ({})",
                "✓ Refreshed".green(),
                address.bold(),
                remote_state.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        Err(e @ CloudError::Gone { .. }) => {
            println!("{} {}", "!".yellow(), e.to_string().yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
