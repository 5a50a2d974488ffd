//! Mapping wait results onto the recorded state
//!
//! | result                  | record                              | returned            |
//! |-------------------------|-------------------------------------|---------------------|
//! | converged               | ID/attributes persisted, `Ready`    | `Ok`                |
//! | converged on delete     | cleared                             | `Ok`                |
//! | not found, delete       | cleared                             | `Ok`                |
//! | not found, otherwise    | cleared                             | `Err`               |
//! | timeout / cancelled     | last observation kept, in progress  | `Err`               |
//! | unexpected state        | last observation kept, `Failed`     | `Err`               |
//! | probe failure / invalid | untouched                           | `Err`               |

use crate::error::{CloudError, Result};
use crate::model::RemoteObject;
use crate::operation::{Operation, ResourceKind};
use crate::state::{ResourceState, ResourceStatus};
use stratus_wait::{Converged, WaitError};

pub(crate) fn settle<T: RemoteObject>(
    operation: Operation,
    kind: ResourceKind,
    id: &str,
    record: &mut ResourceState,
    result: std::result::Result<Converged<T>, WaitError<T>>,
) -> Result<Option<T>> {
    let err = match result {
        Ok(converged) => {
            if operation == Operation::Delete {
                tracing::info!("Deleted {} {}", kind.display_name(), id);
                record.clear();
                return Ok(None);
            }
            if let Some(raw) = &converged.raw {
                record.observe(raw)?;
            } else {
                record.remote_state = Some(converged.state.clone());
            }
            record.set_status(ResourceStatus::Ready);
            return Ok(converged.raw);
        }
        Err(err) => err,
    };

    let (err, last_raw) = err.split_last_raw();

    if err.is_not_found() {
        record.clear();
        if operation == Operation::Delete {
            tracing::info!("{} {} is already gone", kind.display_name(), id);
            return Ok(None);
        }
        tracing::warn!(
            "{} {} disappeared during {}, removing it from state",
            kind.display_name(),
            id,
            operation
        );
        return Err(wait_error(operation, kind, id, err));
    }

    if let Some(raw) = &last_raw {
        record.observe(raw)?;
    }

    match &err {
        WaitError::UnexpectedState { state, .. } => {
            record.remote_state = Some(state.clone());
            record.set_status(ResourceStatus::Failed);
        }
        WaitError::Timeout { last_state, .. } | WaitError::Cancelled { last_state, .. } => {
            if last_state.is_some() {
                record.remote_state = last_state.clone();
            }
            record.set_status(operation.in_progress_status());
        }
        _ => {}
    }

    Err(wait_error(operation, kind, id, err))
}

fn wait_error(
    operation: Operation,
    kind: ResourceKind,
    id: &str,
    source: WaitError<()>,
) -> CloudError {
    CloudError::Wait {
        operation,
        kind,
        id: id.to_string(),
        source,
    }
}
