use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-user mutual exclusion for order execution.
///
/// Two simultaneous orders for the same user must not interleave between
/// reading and writing the cash balance. The database row lock already
/// serializes them at commit time; this registry serializes them before
/// the transaction even opens, so in-process contention resolves by
/// queueing instead of conflict-and-retry. Orders for different users
/// never block each other.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one user, waiting behind any in-flight order
    /// for the same user. The guard releases on drop.
    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_user_is_exclusive() {
        let locks = Arc::new(UserLocks::new());
        let user = Uuid::new_v4();

        let guard = locks.acquire(user).await;

        let locks2 = locks.clone();
        let contender = tokio::spawn(async move {
            let _guard = locks2.acquire(user).await;
        });

        // The second acquire cannot complete while the guard is held.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        // Completes immediately despite the held guard for another user.
        let _b = locks.acquire(Uuid::new_v4()).await;
    }
}
