pub mod create;
pub mod delete;
pub mod refresh;
pub mod resize;
pub mod state;

use crate::utils;
use std::path::Path;
use std::sync::Arc;
use stratus_cloud::{
    GlobalState, KeyedLock, Provisioner, ResourceKind, ResourceState, StateLock, StateManager,
};
use stratus_config::Settings;
use stratus_openstack::OpenStackClient;
use tokio_util::sync::CancellationToken;

/// A state file held under its lock for the duration of one command
pub struct Session {
    manager: StateManager,
    state: GlobalState,
    lock: StateLock,
}

impl Session {
    pub async fn open(project_root: &Path) -> anyhow::Result<Self> {
        let manager = StateManager::new(project_root);
        let lock = manager.acquire_lock().await?;
        let state = manager.load().await?;
        Ok(Self {
            manager,
            state,
            lock,
        })
    }

    /// Recorded state for `address`, or an untracked record
    pub fn record(&self, kind: ResourceKind, address: &str) -> ResourceState {
        self.state
            .get_resource(address)
            .cloned()
            .unwrap_or_else(|| ResourceState::untracked(kind))
    }

    /// Store `record` (dropping it when untracked), save, and release the lock
    pub async fn commit(mut self, address: String, record: ResourceState) -> anyhow::Result<()> {
        self.state.set_resource(address, record);
        self.manager.save(&self.state).await?;
        self.lock.release().await?;
        Ok(())
    }
}

/// Provisioner wired to the configured client, cancelled by Ctrl-C
pub fn provisioner(settings: &Settings) -> anyhow::Result<Provisioner<OpenStackClient>> {
    let client = utils::build_client(settings)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling the current wait");
            on_interrupt.cancel();
        }
    });

    Ok(Provisioner::new(
        Arc::new(client),
        KeyedLock::new(),
        utils::provision_settings(settings),
    )
    .with_cancellation(cancel))
}
