mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use stratus_cloud::{CloudError, ResourceKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Provision cloud resources and wait until they settle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a resource and wait for it to become ready
    Create {
        /// Resource kind (network, router_interface, volume, volume_attach, loadbalancer, cluster, keypair)
        kind: ResourceKind,
        /// Name the resource is recorded under
        name: String,
        /// Creation parameter (repeatable). Values that parse as JSON numbers,
        /// booleans, arrays or objects are passed as such; dotted keys nest.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Delete a resource and wait until it is gone
    Delete {
        kind: ResourceKind,
        name: String,
        /// Also delete a load balancer's listeners and pools
        #[arg(long)]
        cascade: bool,
    },
    /// Re-read a resource and update the recorded attributes
    Refresh {
        kind: ResourceKind,
        name: String,
    },
    /// Change the worker node count of a cluster
    Resize {
        /// Cluster name
        name: String,
        /// New number of worker nodes
        node_count: u32,
    },
    /// Show the recorded resources
    State,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // version needs no settings
    if matches!(cli.command, Commands::Version) {
        println!("stratus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = match stratus_config::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!(
                "{}",
                "Check stratus.yaml or the file named by STRATUS_CONFIG".yellow()
            );
            std::process::exit(1);
        }
    };

    init_logging(settings.enable_logging);

    let project_root = std::env::current_dir()?;
    let result = match cli.command {
        Commands::Create { kind, name, set } => {
            commands::create::handle(&settings, &project_root, kind, &name, &set).await
        }
        Commands::Delete {
            kind,
            name,
            cascade,
        } => commands::delete::handle(&settings, &project_root, kind, &name, cascade).await,
        Commands::Refresh { kind, name } => {
            commands::refresh::handle(&settings, &project_root, kind, &name).await
        }
        Commands::Resize { name, node_count } => {
            commands::resize::handle(&settings, &project_root, &name, node_count).await
        }
        Commands::State => commands::state::handle(&project_root).await,
        Commands::Version => Ok(()),
    };

    if let Err(e) = result {
        std::process::exit(report(&e));
    }

    Ok(())
}

fn init_logging(enable_logging: bool) {
    let filter = if enable_logging {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a failure and pick the exit code
fn report(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CloudError>() {
        Some(cloud) if cloud.is_cancelled() => {
            eprintln!("{} {}", "Interrupted:".yellow().bold(), cloud);
            eprintln!(
                "{}",
                "The last observed state was saved; run `stratus refresh` to pick it up again"
                    .yellow()
            );
            130
        }
        Some(cloud) if cloud.is_timeout() => {
            eprintln!("{} {}", "Timed out:".red().bold(), cloud);
            eprintln!(
                "{}",
                "The resource is still recorded in state; run `stratus refresh` once it settles"
                    .yellow()
            );
            1
        }
        _ => {
            eprintln!("{} {:#}", "Error:".red().bold(), error);
            1
        }
    }
}
