//! Keyed mutual exclusion
//!
//! Serializes mutate+wait sequences that touch the same remote object
//! (for example two interfaces being added to one router). One async mutex
//! exists per key while anyone holds or waits for it. A waiter dropped after
//! the holder released leaves its entry behind until the next `lock` call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Table = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// One lock per object identifier. Clones share the same table.
#[derive(Clone, Default)]
pub struct KeyedLock {
    table: Table,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut table = lock_table(&self.table);
            // entries left behind by waits that were dropped before acquiring
            table.retain(|k, slot| k == key || Arc::strong_count(slot) > 1);
            table.entry(key.to_string()).or_default().clone()
        };

        tracing::trace!("Waiting for lock on {}", key);
        let guard = slot.clone().lock_owned().await;
        tracing::trace!("Locked {}", key);

        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
            slot,
            table: self.table.clone(),
        }
    }

    /// Number of keys in the table
    pub fn active_keys(&self) -> usize {
        lock_table(&self.table).len()
    }
}

fn lock_table(table: &Table) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the key on drop
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    slot: Arc<AsyncMutex<()>>,
    table: Table,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut table = lock_table(&self.table);
        // Only the table and this guard reference the slot: nobody is waiting
        if Arc::strong_count(&self.slot) == 2 {
            table.remove(&self.key);
        }
        tracing::trace!("Unlocked {}", self.key);
    }
}
