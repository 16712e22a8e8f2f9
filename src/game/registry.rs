//! Player Registration
//!
//! A name is claimed with an atomic set-add on `usednames`; only the caller
//! whose add actually inserted the name goes on to spawn the player. Names
//! are never released, so a name is usable exactly once.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::core::geometry::{random_point, Cell};
use crate::core::rng::GameRng;
use crate::error::{GameError, NameRejection};
use crate::store::{keys, GameStore};

/// Check length rules for a name. Does not consult the store.
pub fn validate_name(name: &str, max_len: usize) -> Result<(), NameRejection> {
    if name.is_empty() {
        return Err(NameRejection::Empty);
    }
    if name.len() > max_len {
        return Err(NameRejection::TooLong {
            len: name.len(),
            max: max_len,
        });
    }
    Ok(())
}

/// Registers players against the store.
pub struct PlayerRegistry<S> {
    store: Arc<S>,
    rng: Arc<Mutex<GameRng>>,
    width: i32,
    height: i32,
    max_name_len: usize,
}

impl<S: GameStore> PlayerRegistry<S> {
    /// Create a registry.
    pub fn new(
        store: Arc<S>,
        rng: Arc<Mutex<GameRng>>,
        width: i32,
        height: i32,
        max_name_len: usize,
    ) -> Self {
        Self {
            store,
            rng,
            width,
            height,
            max_name_len,
        }
    }

    /// Register `name` and spawn it. Returns the spawn cell.
    ///
    /// Rejections leave the store untouched. If a write fails after the name
    /// was claimed, the name stays used and the error is returned.
    #[instrument(skip(self), level = "debug")]
    pub async fn register(&self, name: &str) -> Result<Cell, GameError> {
        validate_name(name, self.max_name_len)?;

        if !self.store.sadd(keys::USED_NAMES, name).await? {
            debug!(name, "name already used");
            return Err(NameRejection::AlreadyUsed.into());
        }

        let spawn = {
            let mut rng = self.rng.lock().await;
            random_point(&mut rng, self.width, self.height)
        };

        let writes = async {
            self.store.set(&keys::player(name), &spawn.to_string()).await?;
            self.store.zadd(keys::SCORES, name, 0).await
        };
        if let Err(err) = writes.await {
            warn!(name, %err, "registration claimed name but failed to spawn");
            return Err(err.into());
        }

        info!(name, %spawn, "player registered");
        Ok(spawn)
    }

    /// Whether `name` was ever registered.
    pub async fn is_used(&self, name: &str) -> Result<bool, GameError> {
        Ok(self.store.sismember(keys::USED_NAMES, name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry(store: Arc<MemoryStore>) -> PlayerRegistry<MemoryStore> {
        PlayerRegistry::new(store, Arc::new(Mutex::new(GameRng::new(21))), 64, 64, 32)
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("", 32), Err(NameRejection::Empty));
        assert!(validate_name("a", 32).is_ok());
        assert!(validate_name(&"x".repeat(32), 32).is_ok());
        assert_eq!(
            validate_name(&"x".repeat(33), 32),
            Err(NameRejection::TooLong { len: 33, max: 32 })
        );
        // Limit is in bytes, not characters
        assert!(validate_name(&"é".repeat(17), 32).is_err());
    }

    #[tokio::test]
    async fn test_register_spawns_player() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());

        let spawn = registry.register("alice").await.unwrap();
        assert!(spawn.is_on_board(64, 64));
        assert_eq!(
            store.get("player:alice").await.unwrap(),
            Some(spawn.to_string())
        );
        assert_eq!(store.zscore(keys::SCORES, "alice").await.unwrap(), Some(0));
        assert!(registry.is_used("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store);

        registry.register("alice").await.unwrap();
        assert!(matches!(
            registry.register("alice").await,
            Err(GameError::InvalidName(NameRejection::AlreadyUsed))
        ));
    }

    #[tokio::test]
    async fn test_invalid_names_leave_no_trace() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());

        assert!(matches!(
            registry.register("").await,
            Err(GameError::InvalidName(NameRejection::Empty))
        ));
        assert!(matches!(
            registry.register(&"z".repeat(33)).await,
            Err(GameError::InvalidName(NameRejection::TooLong { .. }))
        ));
        assert_eq!(store.key_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());
        store.set_available(false);
        assert!(matches!(
            registry.register("alice").await,
            Err(GameError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_name_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(registry(store));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.register("zoe").await }));
        }
        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(err) => assert_eq!(err, GameError::InvalidName(NameRejection::AlreadyUsed)),
            }
        }
        assert_eq!(winners, 1);
    }
}
