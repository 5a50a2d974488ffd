//! State management for provisioned resources
//!
//! Manages the `.stratus/state.json` file which records, per resource
//! address, the remote identifier and the attributes last observed.
//! Commands that mutate resources hold `.stratus/lock.json` while they run.

use crate::error::{CloudError, Result};
use crate::model::RemoteObject;
use crate::operation::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".stratus";
const STATE_FILE: &str = "state.json";
const STATE_STAGING: &str = "state.json.tmp";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";
const STALE_LOCK_HOURS: i64 = 1;

/// Every tracked resource, keyed by address (`kind.name`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address under which a resource is stored
    pub fn address(kind: ResourceKind, name: &str) -> String {
        format!("{}.{}", kind, name)
    }

    /// Store `record` under `address`. A record that no longer references a
    /// remote object removes the entry.
    pub fn set_resource(&mut self, address: String, record: ResourceState) {
        if record.is_tracked() {
            self.resources.insert(address, record);
        } else if self.resources.remove(&address).is_some() {
            tracing::debug!("Dropped {} from state", address);
        }
        self.updated_at = Utc::now();
    }

    pub fn get_resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }
}

/// Recorded state of a single resource.
///
/// An empty `id` means the record no longer references a remote object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-specific resource ID
    pub id: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Current status
    pub status: ResourceStatus,

    /// Remote state label last observed (e.g. `BUILD`, `in-use`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_state: Option<String>,

    /// Resource attributes as last reported by the API
    pub attributes: BTreeMap<String, serde_json::Value>,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            status: ResourceStatus::Unknown,
            remote_state: None,
            attributes: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Empty record for a resource that has not been created yet
    pub fn untracked(kind: ResourceKind) -> Self {
        Self::new(String::new(), kind)
    }

    pub fn is_tracked(&self) -> bool {
        !self.id.is_empty()
    }

    /// The recorded ID, or an error naming the kind
    pub fn require_id(&self) -> Result<String> {
        if self.is_tracked() {
            Ok(self.id.clone())
        } else {
            Err(CloudError::InvalidId(format!(
                "{} has no recorded ID",
                self.kind.display_name()
            )))
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Record a remote object: its ID, state label and serialized fields
    pub fn observe<T: RemoteObject>(&mut self, object: &T) -> Result<()> {
        self.id = object.id().to_string();
        self.remote_state = Some(object.status().to_string());
        self.absorb(object)
    }

    /// Replace the attributes with the serialized fields of `value`
    pub fn absorb<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(fields) => {
                self.attributes = fields.into_iter().collect();
            }
            other => {
                self.attributes.clear();
                self.attributes.insert("value".to_string(), other);
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Drop the reference to the remote object
    pub fn clear(&mut self) {
        self.id.clear();
        self.status = ResourceStatus::Deleted;
        self.remote_state = None;
        self.attributes.clear();
        self.updated_at = Utc::now();
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource is being created
    Creating,
    /// Resource reached its target state
    Ready,
    /// Resource is being updated
    Updating,
    /// Resource is being deleted
    Deleting,
    /// Resource has been deleted
    Deleted,
    /// Resource entered a state nobody waited for
    Failed,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Creating => write!(f, "creating"),
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Updating => write!(f, "updating"),
            ResourceStatus::Deleting => write!(f, "deleting"),
            ResourceStatus::Deleted => write!(f, "deleted"),
            ResourceStatus::Failed => write!(f, "failed"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reads and writes the state directory of one project
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(STATE_DIR),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Load the state file. A missing file is an empty state.
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.file(STATE_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting empty", path.display());
                return Ok(GlobalState::new());
            }
            Err(err) => return Err(err.into()),
        };

        let state: GlobalState = serde_json::from_str(&content).map_err(|err| {
            CloudError::StateError(format!("{} is not valid state: {}", path.display(), err))
        })?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "{} has version {}, this build reads up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            )));
        }

        tracing::debug!("Loaded {} resources from {}", state.resources.len(), path.display());
        Ok(state)
    }

    /// Write the state through a staging file. The previous state is kept as
    /// `state.json.backup`.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.file(STATE_FILE);
        let staging = self.file(STATE_STAGING);
        fs::write(&staging, serde_json::to_vec_pretty(state)?).await?;

        if fs::try_exists(&path).await? {
            fs::copy(&path, self.file(STATE_BACKUP)).await?;
        }
        fs::rename(&staging, &path).await?;

        tracing::debug!("Saved {} resources to {}", state.resources.len(), path.display());
        Ok(())
    }

    /// Take the project-wide lock. A lock older than an hour is treated as
    /// abandoned and replaced.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.file(LOCK_FILE);
        let holder = LockHolder::current();

        for _ in 0..2 {
            match create_exclusive(&path, &holder).await {
                Ok(()) => {
                    tracing::debug!("Acquired state lock as {}", holder);
                    return Ok(StateLock {
                        path,
                        released: false,
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    let existing = LockHolder::read(&path).await?;
                    if !existing.is_stale() {
                        return Err(CloudError::LockError(format!(
                            "State is locked by {} since {}",
                            existing, existing.acquired_at
                        )));
                    }
                    tracing::warn!("Taking over stale state lock held by {}", existing);
                    remove_if_present(&path).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(CloudError::LockError(format!(
            "{} keeps reappearing; another process is competing for it",
            path.display()
        )))
    }
}

async fn create_exclusive(path: &Path, holder: &LockHolder) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(&serde_json::to_vec_pretty(holder)?).await?;
    file.flush().await
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Contents of `lock.json`
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    holder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pid: Option<u32>,
    acquired_at: DateTime<Utc>,
}

impl LockHolder {
    fn current() -> Self {
        let host = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            holder: host,
            pid: Some(std::process::id()),
            acquired_at: Utc::now(),
        }
    }

    async fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|_| {
            CloudError::LockError(format!(
                "{} is unreadable; remove it if no other stratus process is running",
                path.display()
            ))
        })
    }

    fn is_stale(&self) -> bool {
        Utc::now().signed_duration_since(self.acquired_at)
            >= chrono::Duration::hours(STALE_LOCK_HOURS)
    }
}

impl std::fmt::Display for LockHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "{} (pid {})", self.holder, pid),
            None => f.write_str(&self.holder),
        }
    }
}

/// Exclusive hold on the state directory. Dropping it removes the lock file.
pub struct StateLock {
    path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        remove_if_present(&self.path).await?;
        tracing::debug!("Released state lock");
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!("Could not remove {}: {}", self.path.display(), err);
            }
        }
    }
}
