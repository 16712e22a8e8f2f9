//! Persistent Store Adapter
//!
//! The game talks to its backing key-value store only through [`GameStore`].
//! The trait mirrors the handful of Redis-style primitives the game needs and
//! carries no game logic. Every call may suspend and may fail independently;
//! nothing here is atomic across calls.

use async_trait::async_trait;

use crate::error::StoreError;

pub mod keys;
pub mod memory;
pub mod timed;

pub use memory::MemoryStore;
pub use timed::TimedStore;

/// Key/value, hash, sorted-set and set primitives over the external store.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Read a scalar key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a scalar key.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read several scalar keys. The result is positional.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Read one hash field.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Write one hash field.
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Write several hash fields in one call.
    async fn hset_many(&self, key: &str, entries: &[(String, String)]) -> Result<(), StoreError>;

    /// Delete one hash field atomically. Returns `true` only for the caller
    /// that actually removed it.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Read every field of a hash.
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Number of fields in a hash.
    async fn hlen(&self, key: &str) -> Result<usize, StoreError>;

    /// Set a sorted-set member's score.
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError>;

    /// Add `delta` to a member's score (creating it at 0). Returns the new score.
    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64, StoreError>;

    /// Read a member's score.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError>;

    /// All members with scores, highest first. Ties are ordered by member.
    async fn zrevrange_withscores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError>;

    /// Add a set member. Returns `true` if it was not present before.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Check set membership.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError>;
}
