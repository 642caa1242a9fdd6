//! Per-user serialization of read-then-write sequences.
//!
//! Cart, address and checkout mutations read state, decide, then write. Two
//! concurrent requests from the same user could otherwise both pass a stock
//! check or both promote a primary address. Each user gets an async mutex held
//! for the whole sequence; different users never contend.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use toko_core::UserId;

/// Idle time after which a user's lock entry is dropped.
const LOCK_IDLE: Duration = Duration::from_secs(10 * 60);

/// Upper bound on tracked users.
const MAX_USERS: u64 = 100_000;

/// Registry of per-user mutexes.
#[derive(Clone)]
pub struct UserLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl UserLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(MAX_USERS)
                .time_to_idle(LOCK_IDLE)
                .build(),
        }
    }

    /// Wait for and take the lock of `user_id`.
    ///
    /// The returned guard releases the lock when dropped. An entry evicted
    /// while held stays valid for its holder: the guard owns the mutex.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with(user_id, async { Arc::new(Mutex::new(())) })
            .await;
        mutex.lock_owned().await
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UserLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLocks")
            .field("entries", &self.locks.entry_count())
            .finish()
    }
}
