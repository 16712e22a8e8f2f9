//! Per-key mutual exclusion.
//!
//! Moves for the same player must not interleave their read-modify-write of
//! the player's position. Each name gets its own async mutex; moves for
//! different players never contend. Registered players keep their entry;
//! callers drop entries for names that turned out not to exist.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per key, created on first use.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the entry for `key` if no task holds or waits on it.
    ///
    /// Call after releasing the guard. Returns whether the entry was removed.
    pub async fn forget_if_idle(&self, key: &str) -> bool {
        let mut locks = self.locks.lock().await;
        let idle = locks
            .get(key)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if idle {
            locks.remove(key);
        }
        idle
    }

    /// Number of keys currently tracked.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether no key has been locked yet.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("alice").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len().await, 1);
    }

    #[tokio::test]
    async fn test_forget_only_idle_entries() {
        let locks = KeyedLocks::new();

        let guard = locks.acquire("ghost").await;
        assert!(!locks.forget_if_idle("ghost").await);
        drop(guard);
        assert!(locks.forget_if_idle("ghost").await);
        assert!(locks.is_empty().await);
        assert!(!locks.forget_if_idle("never-seen").await);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire("alice").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("bob")).await;
        assert!(b.is_ok());
        assert!(!locks.is_empty().await);
    }
}
