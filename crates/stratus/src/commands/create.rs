use super::Session;
use crate::utils;
use anyhow::{Context, bail};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use stratus_cloud::model::{
    AddInterfaceOpts, AttachVolumeOpts, CreateClusterOpts, CreateKeypairOpts,
    CreateLoadBalancerOpts, CreateNetworkOpts, CreateVolumeOpts,
};
use stratus_cloud::{GlobalState, ResourceKind};
use stratus_config::Settings;

pub async fn handle(
    settings: &Settings,
    project_root: &Path,
    kind: ResourceKind,
    name: &str,
    pairs: &[String],
) -> anyhow::Result<()> {
    let params = utils::parse_params(name, pairs)?;
    let provisioner = super::provisioner(settings)?;

    let address = GlobalState::address(kind, name);
    let session = Session::open(project_root).await?;
    let mut record = session.record(kind, &address);
    if record.is_tracked() {
        bail!(
            "{} is already recorded with id {}; delete it first",
            address,
            record.id
        );
    }

    println!("{} {}", "Creating".cyan(), address.bold());

    let result = async {
        let mut params = params;
        match kind {
            ResourceKind::Network => {
                let opts: CreateNetworkOpts = options(kind, params)?;
                provisioner.create_network(&opts, &mut record).await?;
            }
            ResourceKind::RouterInterface => {
                let router_id = utils::take_string(&mut params, "router_id")?;
                let opts: AddInterfaceOpts = options(kind, params)?;
                provisioner
                    .create_router_interface(&router_id, &opts, &mut record)
                    .await?;
            }
            ResourceKind::Volume => {
                let opts: CreateVolumeOpts = options(kind, params)?;
                provisioner.create_volume(&opts, &mut record).await?;
            }
            ResourceKind::VolumeAttach => {
                let opts: AttachVolumeOpts = options(kind, params)?;
                provisioner.attach_volume(&opts, &mut record).await?;
            }
            ResourceKind::LoadBalancer => {
                let opts: CreateLoadBalancerOpts = options(kind, params)?;
                provisioner.create_loadbalancer(&opts, &mut record).await?;
            }
            ResourceKind::Cluster => {
                let opts: CreateClusterOpts = options(kind, params)?;
                provisioner.create_cluster(&opts, &mut record).await?;
            }
            ResourceKind::Keypair => {
                let opts: CreateKeypairOpts = options(kind, params)?;
                let keypair = provisioner.create_keypair(&opts, &mut record).await?;
                if let Some(private_key) = &keypair.private_key {
                    println!("{}", "Generated private key (shown once):".yellow());
                    println!("{}", private_key);
                }
            }
        }
        anyhow::Ok(())
    }
    .await;

    // whatever was observed is kept, including on failure
    let id = record.id.clone();
    let status = record.status;
    session.commit(address.clone(), record).await?;
    result?;

    println!(
        "{} {} ({}, {})",
        "✓ Created".green(),
        address.bold(),
        id.cyan(),
        status
    );
    Ok(())
}

fn options<T: DeserializeOwned>(kind: ResourceKind, params: Map<String, Value>) -> anyhow::Result<T> {
    serde_json::from_value(Value::Object(params))
        .with_context(|| format!("invalid parameters for {}", kind.display_name()))
}
