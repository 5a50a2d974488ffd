use colored::Colorize;
use std::path::Path;
use stratus_cloud::StateManager;

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    let state = StateManager::new(project_root).load().await?;

    if state.resources.is_empty() {
        println!("{}", "No resources in state".yellow());
        return Ok(());
    }

    println!(
        "{:<36} {:<40} {:<10} {}",
        "ADDRESS".bold(),
        "ID".bold(),
        "STATUS".bold(),
        "REMOTE".bold()
    );
    for (address, resource) in &state.resources {
        println!(
            "{:<36} {:<40} {:<10} {}",
            address,
            resource.id,
            resource.status.to_string(),
            resource.remote_state.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!(
        "{} resources, updated {}",
        state.resources.len(),
        state.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    Ok(())
}
