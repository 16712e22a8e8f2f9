//! Per-call timeout wrapper.
//!
//! Wraps any [`GameStore`] so that no single call can hang a request. A call
//! that exceeds the budget is reported as [`StoreError::Timeout`]; whether it
//! took effect on the backend is unknown, so callers treat it as failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::GameStore;
use crate::error::StoreError;

/// A [`GameStore`] that bounds every call by a fixed timeout.
pub struct TimedStore<S> {
    inner: Arc<S>,
    timeout: Duration,
}

impl<S: GameStore> TimedStore<S> {
    /// Wrap `inner`, bounding each call by `timeout`.
    pub fn new(inner: Arc<S>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Configured per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout {
                    op,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<S: GameStore> GameStore for TimedStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.bounded("set", self.inner.set(key, value)).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        self.bounded("mget", self.inner.mget(keys)).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.bounded("hget", self.inner.hget(key, field)).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.bounded("hset", self.inner.hset(key, field, value)).await
    }

    async fn hset_many(&self, key: &str, entries: &[(String, String)]) -> Result<(), StoreError> {
        self.bounded("hset", self.inner.hset_many(key, entries)).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.bounded("hdel", self.inner.hdel(key, field)).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.bounded("hgetall", self.inner.hgetall(key)).await
    }

    async fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        self.bounded("hlen", self.inner.hlen(key)).await
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError> {
        self.bounded("zadd", self.inner.zadd(key, member, score)).await
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64, StoreError> {
        self.bounded("zincrby", self.inner.zincrby(key, member, delta)).await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        self.bounded("zscore", self.inner.zscore(key, member)).await
    }

    async fn zrevrange_withscores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.bounded("zrevrange", self.inner.zrevrange_withscores(key)).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.bounded("sadd", self.inner.sadd(key, member)).await
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.bounded("sismember", self.inner.sismember(key, member)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let store = TimedStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        store.set("player:a", "0,0").await.unwrap();
        assert_eq!(store.get("player:a").await.unwrap().as_deref(), Some("0,0"));
        assert!(store.sadd("usednames", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_slow_calls_time_out() {
        let slow = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let store = TimedStore::new(slow, Duration::from_millis(20));

        let err = store.hlen("coins").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Timeout {
                op: "hlen",
                after: Duration::from_millis(20),
            }
        );
    }

    #[tokio::test]
    async fn test_inner_errors_propagate() {
        let inner = Arc::new(MemoryStore::new());
        inner.set_available(false);
        let store = TimedStore::new(inner.clone(), Duration::from_secs(1));
        assert!(matches!(
            store.get("x").await,
            Err(StoreError::Unavailable { op: "get", .. })
        ));
        assert!(Arc::ptr_eq(store.inner(), &inner));
    }
}
