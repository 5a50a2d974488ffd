//! Cloud provider error types

use crate::operation::{Operation, ResourceKind};
use stratus_wait::{ProbeError, WaitError, WaitErrorKind};
use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid resource ID: {0}")]
    InvalidId(String),

    #[error("Error waiting for {} {id} to {operation}: {source}", .kind.display_name())]
    Wait {
        operation: Operation,
        kind: ResourceKind,
        id: String,
        #[source]
        source: WaitError<()>,
    },

    #[error("{} {id} no longer exists ({operation}); it has been removed from state", .kind.display_name())]
    Gone {
        operation: Operation,
        kind: ResourceKind,
        id: String,
    },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CloudError::Conflict(_))
    }

    /// Classification of the underlying wait failure, if any
    pub fn wait_kind(&self) -> Option<WaitErrorKind> {
        match self {
            CloudError::Wait { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.wait_kind() == Some(WaitErrorKind::Timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.wait_kind() == Some(WaitErrorKind::Cancelled)
    }

    /// Whether the remote object turned out to be gone
    pub fn is_disappearance(&self) -> bool {
        matches!(self, CloudError::Gone { .. })
            || self.wait_kind() == Some(WaitErrorKind::NotFound)
    }
}

impl ProbeError for CloudError {
    fn is_not_found(&self) -> bool {
        CloudError::is_not_found(self)
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
