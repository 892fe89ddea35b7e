use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Lock wait exceeded the configured bound.
#[derive(Debug, thiserror::Error)]
#[error("timed out waiting for exclusive access to '{key}'")]
pub struct LockTimeout {
    pub key: String,
}

/// Registry of per-document exclusive locks.
///
/// Serializes content resets of the same document: the guard must be held
/// across the truncate and the immediately following state update. Locks
/// for different keys never contend. Guards release on drop, cancellation
/// included.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the exclusive lock for `key`, waiting at most `wait`.
    pub async fn acquire(
        &self,
        key: &str,
        wait: Duration,
    ) -> Result<OwnedMutexGuard<()>, LockTimeout> {
        let lock = self
            .locks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        tokio::time::timeout(wait, lock.lock_owned())
            .await
            .map_err(|_| LockTimeout {
                key: key.to_owned(),
            })
    }

    /// Forgets the lock entry of a document.
    ///
    /// Only call once the document is gone: a holder of the old entry keeps
    /// its guard, but later acquisitions start from a fresh mutex.
    pub fn forget(&self, key: &str) {
        self.locks.remove(key);
    }
}
