//! Per-scope serialization within one process
//!
//! Mutations of one capacity scope queue on the same async mutex so requests
//! served by this process do not contend on the database locks. Capacity
//! itself is enforced by the stores, which serialize across processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use crate::models::CapacityScope;

/// Idle entries are pruned once the table grows past this size
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Default)]
pub struct ScopeLocks {
    locks: Arc<Mutex<HashMap<CapacityScope, Arc<AsyncMutex<()>>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `scope`; released when the guard drops
    pub async fn acquire(&self, scope: CapacityScope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(scope).or_default().clone()
        };

        lock.lock_owned().await
    }

    /// Lock several scopes at once. Scopes are taken in sorted order so two
    /// multi-scope holders never deadlock.
    pub async fn acquire_all(&self, mut scopes: Vec<CapacityScope>) -> Vec<OwnedMutexGuard<()>> {
        scopes.sort_unstable();
        scopes.dedup();

        let mut guards = Vec::with_capacity(scopes.len());
        for scope in scopes {
            guards.push(self.acquire(scope).await);
        }
        guards
    }

    /// Number of tracked scopes
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
