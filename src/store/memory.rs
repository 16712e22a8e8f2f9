//! In-memory store backend.
//!
//! Follows Redis semantics for the primitives in [`GameStore`]: one keyspace,
//! each key holding exactly one structure kind, empty hashes and sets
//! disappearing, and `WrongType` when a key is used as the wrong kind.
//!
//! Every call suspends at least once (or sleeps for the configured latency)
//! so concurrent callers interleave the way they would against a remote
//! store. An outage switch and per-operation failure injection let tests
//! exercise the error paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::GameStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    ZSet(HashMap<String, i64>),
    Set(HashSet<String>),
}

/// In-memory [`GameStore`].
pub struct MemoryStore {
    keyspace: RwLock<HashMap<String, Value>>,
    latency: Duration,
    available: AtomicBool,
    failing_ops: RwLock<HashSet<&'static str>>,
}

impl MemoryStore {
    /// Create an empty store with no artificial latency.
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Create an empty store that sleeps `latency` before every call.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            keyspace: RwLock::new(HashMap::new()),
            latency,
            available: AtomicBool::new(true),
            failing_ops: RwLock::new(HashSet::new()),
        }
    }

    /// Take the store offline (`false`) or bring it back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every call of `op` (e.g. `"zincrby"`) fail until cleared.
    pub async fn fail_op(&self, op: &'static str) {
        self.failing_ops.write().await.insert(op);
    }

    /// Clear all injected failures.
    pub async fn clear_failures(&self) {
        self.failing_ops.write().await.clear();
    }

    /// Number of keys currently stored.
    pub async fn key_count(&self) -> usize {
        self.keyspace.read().await.len()
    }

    async fn enter(&self, op: &'static str) -> Result<(), StoreError> {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                op,
                reason: "store offline".to_string(),
            });
        }
        if self.failing_ops.read().await.contains(op) {
            return Err(StoreError::Unavailable {
                op,
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn read_hash<'a>(
    keyspace: &'a HashMap<String, Value>,
    key: &str,
) -> Result<Option<&'a HashMap<String, String>>, StoreError> {
    match keyspace.get(key) {
        None => Ok(None),
        Some(Value::Hash(hash)) => Ok(Some(hash)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn write_hash<'a>(
    keyspace: &'a mut HashMap<String, Value>,
    key: &str,
) -> Result<&'a mut HashMap<String, String>, StoreError> {
    match keyspace
        .entry(key.to_string())
        .or_insert_with(|| Value::Hash(HashMap::new()))
    {
        Value::Hash(hash) => Ok(hash),
        _ => Err(wrong_type(key)),
    }
}

fn read_zset<'a>(
    keyspace: &'a HashMap<String, Value>,
    key: &str,
) -> Result<Option<&'a HashMap<String, i64>>, StoreError> {
    match keyspace.get(key) {
        None => Ok(None),
        Some(Value::ZSet(zset)) => Ok(Some(zset)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn write_zset<'a>(
    keyspace: &'a mut HashMap<String, Value>,
    key: &str,
) -> Result<&'a mut HashMap<String, i64>, StoreError> {
    match keyspace
        .entry(key.to_string())
        .or_insert_with(|| Value::ZSet(HashMap::new()))
    {
        Value::ZSet(zset) => Ok(zset),
        _ => Err(wrong_type(key)),
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.enter("get").await?;
        let keyspace = self.keyspace.read().await;
        match keyspace.get(key) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.enter("set").await?;
        let mut keyspace = self.keyspace.write().await;
        keyspace.insert(key.to_string(), Value::Str(value.to_string()));
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        self.enter("mget").await?;
        let keyspace = self.keyspace.read().await;
        // Like Redis, non-string keys read as missing rather than failing the batch
        Ok(keys
            .iter()
            .map(|key| match keyspace.get(key) {
                Some(Value::Str(value)) => Some(value.clone()),
                _ => None,
            })
            .collect())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.enter("hget").await?;
        let keyspace = self.keyspace.read().await;
        Ok(read_hash(&keyspace, key)?.and_then(|hash| hash.get(field).cloned()))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.enter("hset").await?;
        let mut keyspace = self.keyspace.write().await;
        write_hash(&mut keyspace, key)?.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_many(&self, key: &str, entries: &[(String, String)]) -> Result<(), StoreError> {
        self.enter("hset").await?;
        if entries.is_empty() {
            return Ok(());
        }
        let mut keyspace = self.keyspace.write().await;
        let hash = write_hash(&mut keyspace, key)?;
        for (field, value) in entries {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.enter("hdel").await?;
        let mut keyspace = self.keyspace.write().await;
        let (removed, now_empty) = match keyspace.get_mut(key) {
            None => return Ok(false),
            Some(Value::Hash(hash)) => (hash.remove(field).is_some(), hash.is_empty()),
            Some(_) => return Err(wrong_type(key)),
        };
        if now_empty {
            keyspace.remove(key);
        }
        Ok(removed)
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.enter("hgetall").await?;
        let keyspace = self.keyspace.read().await;
        Ok(read_hash(&keyspace, key)?
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        self.enter("hlen").await?;
        let keyspace = self.keyspace.read().await;
        Ok(read_hash(&keyspace, key)?.map_or(0, HashMap::len))
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError> {
        self.enter("zadd").await?;
        let mut keyspace = self.keyspace.write().await;
        write_zset(&mut keyspace, key)?.insert(member.to_string(), score);
        Ok(())
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64, StoreError> {
        self.enter("zincrby").await?;
        let mut keyspace = self.keyspace.write().await;
        let score = write_zset(&mut keyspace, key)?
            .entry(member.to_string())
            .or_insert(0);
        *score += delta;
        Ok(*score)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        self.enter("zscore").await?;
        let keyspace = self.keyspace.read().await;
        Ok(read_zset(&keyspace, key)?.and_then(|zset| zset.get(member).copied()))
    }

    async fn zrevrange_withscores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.enter("zrevrange").await?;
        let keyspace = self.keyspace.read().await;
        let mut entries: Vec<(String, i64)> = read_zset(&keyspace, key)?
            .map(|zset| zset.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(entries)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.enter("sadd").await?;
        let mut keyspace = self.keyspace.write().await;
        match keyspace
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()))
        {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.enter("sismember").await?;
        let keyspace = self.keyspace.read().await;
        match keyspace.get(key) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(_) => Err(wrong_type(key)),
        }
    }
}
