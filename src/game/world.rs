//! Game World
//!
//! Facade that wires the registry, movement engine, coin layout and snapshot
//! builder to one injected store. This is the surface a transport calls.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument};

use crate::config::{ConfigError, GameConfig};
use crate::core::geometry::Cell;
use crate::core::rng::GameRng;
use crate::error::GameError;
use crate::game::coins::CoinLayout;
use crate::game::events::{EventBus, WorldEvent};
use crate::game::movement::{MoveOutcome, MovementEngine};
use crate::game::registry::PlayerRegistry;
use crate::game::snapshot::{SnapshotBuilder, WorldSnapshot};
use crate::store::GameStore;

/// The authoritative game world.
pub struct GameWorld<S> {
    config: GameConfig,
    store: Arc<S>,
    registry: PlayerRegistry<S>,
    engine: MovementEngine<S>,
    coins: Arc<CoinLayout<S>>,
    snapshots: SnapshotBuilder<S>,
    events: EventBus,
}

impl<S: GameStore> GameWorld<S> {
    /// Build a world over `store`. The store is not touched until [`Self::init`].
    pub fn new(store: Arc<S>, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = Arc::new(Mutex::new(GameRng::from_seed_or_entropy(config.rng_seed)));
        let coins = Arc::new(CoinLayout::new(
            store.clone(),
            rng.clone(),
            config.width,
            config.height,
            config.num_coins,
        ));
        let registry = PlayerRegistry::new(
            store.clone(),
            rng,
            config.width,
            config.height,
            config.max_name_len,
        );
        let engine = MovementEngine::new(store.clone(), coins.clone(), config.width, config.height);
        let snapshots = SnapshotBuilder::new(store.clone(), coins.clone());
        let events = EventBus::new(config.event_capacity);

        Ok(Self {
            config,
            store,
            registry,
            engine,
            coins,
            snapshots,
            events,
        })
    }

    /// Place the first coin layout if the store has none.
    ///
    /// Safe to call on every start: an existing layout is kept.
    pub async fn init(&self) -> Result<Option<usize>, GameError> {
        let placed = self.coins.replenish_if_exhausted().await?;
        match placed {
            Some(count) => {
                info!(count, "initial coin layout placed");
                self.events.publish(WorldEvent::CoinsReplenished { count });
            }
            None => info!("existing coin layout kept"),
        }
        Ok(placed)
    }

    /// Register a player. `Ok(false)` for an empty, over-long or used name.
    pub async fn add_player(&self, name: &str) -> Result<bool, GameError> {
        match self.register(name).await {
            Ok(_) => Ok(true),
            Err(GameError::InvalidName(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Register a player, reporting why a name was refused. Returns the spawn cell.
    pub async fn register(&self, name: &str) -> Result<Cell, GameError> {
        let position = self.registry.register(name).await?;
        self.events.publish(WorldEvent::PlayerJoined {
            name: name.to_string(),
            position,
        });
        Ok(position)
    }

    /// Apply a wire-level move (`"U"`, `"R"`, `"D"`, `"L"`).
    #[instrument(skip(self))]
    pub async fn move_player(&self, direction: &str, name: &str) -> Result<MoveOutcome, GameError> {
        let outcome = self.engine.move_player(direction, name).await?;

        if let MoveOutcome::Moved(report) = &outcome {
            if let Some(value) = report.collected {
                self.events.publish(WorldEvent::CoinCollected {
                    name: report.name.clone(),
                    cell: report.position,
                    value,
                    score: report.score,
                });
            }
            if let Some(count) = report.replenished {
                self.events.publish(WorldEvent::CoinsReplenished { count });
            }
            self.events.publish(WorldEvent::PlayerMoved {
                name: report.name.clone(),
                position: report.position,
                score: report.score,
            });
        }

        Ok(outcome)
    }

    /// Best-effort snapshot of positions, leaderboard and coins.
    pub async fn state(&self) -> WorldSnapshot {
        self.snapshots.state().await
    }

    /// Subscribe to world events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.events.subscribe()
    }

    /// Whether `name` was ever registered.
    pub async fn is_registered(&self, name: &str) -> Result<bool, GameError> {
        self.registry.is_used(name).await
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The injected store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
