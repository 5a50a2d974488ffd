use super::Session;
use anyhow::bail;
use colored::Colorize;
use std::path::Path;
use stratus_cloud::{GlobalState, ResourceKind};
use stratus_config::Settings;

pub async fn handle(
    settings: &Settings,
    project_root: &Path,
    name: &str,
    node_count: u32,
) -> anyhow::Result<()> {
    if node_count == 0 {
        bail!("a cluster needs at least one worker node");
    }
    let provisioner = super::provisioner(settings)?;

    let address = GlobalState::address(ResourceKind::Cluster, name);
    let session = Session::open(project_root).await?;
    let mut record = session.record(ResourceKind::Cluster, &address);
    if !record.is_tracked() {
        session.commit(address.clone(), record).await?;
        bail!("{} not found in state", address);
    }

    println!(
        "{} {} to {} nodes",
        "Resizing".cyan(),
        address.bold(),
        node_count
    );
    let result = provisioner.resize_cluster(&mut record, node_count).await;

    session.commit(address.clone(), record).await?;
    let cluster = result?;

    println!(
        "{} {} ({} nodes)",
        "✓ Resized".green(),
        address.bold(),
        cluster.node_count
    );
    Ok(())
}
