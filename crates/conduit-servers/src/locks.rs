//! Per-key async mutual exclusion.
//!
//! Writers to the same note slug are serialised; different slugs
//! proceed independently. An entry lives only while some task holds
//! or waits for its key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;
type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

/// A map of lazily created async mutexes.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: SlotMap,
}

/// Exclusive access to one key. Released when dropped.
#[derive(Debug)]
pub struct KeyGuard {
    // Field order matters: the mutex guard must drop before the claim.
    _guard: OwnedMutexGuard<()>,
    _claim: Claim,
}

/// A task's interest in a key, held from the first wait until release.
#[derive(Debug)]
struct Claim {
    key: String,
    slot: Slot,
    map: SlotMap,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here: nobody else wants the key.
        if Arc::strong_count(&self.slot) == 2 {
            if let Some(slot) = map.get(&self.key) {
                if Arc::ptr_eq(slot, &self.slot) {
                    map.remove(&self.key);
                }
            }
        }
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let claim = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            Claim {
                key: key.to_string(),
                slot: Arc::clone(map.entry(key.to_string()).or_default()),
                map: Arc::clone(&self.inner),
            }
        };
        let guard = Arc::clone(&claim.slot).lock_owned().await;
        KeyGuard {
            _guard: guard,
            _claim: claim,
        }
    }

    /// Number of keys currently held or waited on.
    pub fn key_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
