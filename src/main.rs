//! Coin Grid Server
//!
//! Boots a world over the in-memory store and drives it with concurrent
//! bots, the way a transport would with many connected clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coin_grid::{
    core::rng::GameRng,
    game::MoveOutcome,
    Direction, GameConfig, GameWorld, MemoryStore, TimedStore, VERSION,
};

/// Bots spawned when `COIN_GRID_BOTS` is unset.
const DEFAULT_BOTS: usize = 8;

/// Rounds played when `COIN_GRID_ROUNDS` is unset.
const DEFAULT_ROUNDS: usize = 500;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GameConfig::from_env().context("loading configuration")?;
    info!("Coin Grid Server v{}", VERSION);
    info!(
        "Board: {}x{}, {} coins per layout, store timeout {:?}",
        config.width, config.height, config.num_coins, config.store_timeout
    );

    let bots = env_usize("COIN_GRID_BOTS", DEFAULT_BOTS)?;
    let rounds = env_usize("COIN_GRID_ROUNDS", DEFAULT_ROUNDS)?;

    let store = Arc::new(TimedStore::new(Arc::new(MemoryStore::new()), config.store_timeout));
    let world = Arc::new(GameWorld::new(store, config.clone()).context("building world")?);
    world.init().await.context("placing initial coins")?;

    run_bots(world.clone(), bots, rounds, config.rng_seed).await?;

    let snapshot = world.state().await;
    info!("=== Leaderboard ===");
    for (rank, entry) in snapshot.scores.iter().take(10).enumerate() {
        info!("#{}: {} - {} points", rank + 1, entry.name, entry.score);
    }
    info!("Coins on board: {}", snapshot.coins.len());
    info!("Snapshot digest: {}", hex::encode(snapshot.digest()));
    if !snapshot.complete {
        warn!("final snapshot is incomplete");
    }

    Ok(())
}

/// Register `bots` players and let each take `rounds` random steps concurrently.
async fn run_bots(
    world: Arc<GameWorld<TimedStore<MemoryStore>>>,
    bots: usize,
    rounds: usize,
    seed: Option<u64>,
) -> Result<()> {
    let mut names = Vec::with_capacity(bots);
    for i in 0..bots {
        let name = format!("bot-{i:02}");
        let position = world.register(&name).await.with_context(|| format!("registering {name}"))?;
        info!("Added {} at {}", name, position);
        names.push(name);
    }

    let tasks = names.into_iter().enumerate().map(|(i, name)| {
        let world = world.clone();
        let mut rng = GameRng::from_seed_or_entropy(seed.map(|s| s.wrapping_add(i as u64 + 1)));
        tokio::spawn(async move {
            let mut collected = 0u32;
            for _ in 0..rounds {
                let direction = Direction::ALL[rng.next_int(4) as usize];
                match world.move_player(direction.as_str(), &name).await {
                    Ok(MoveOutcome::Moved(report)) => collected += report.collected.unwrap_or(0),
                    Ok(MoveOutcome::Ignored) => {}
                    Err(err) => warn!(%name, %err, "move failed"),
                }
            }
            (name, collected)
        })
    });

    for result in join_all(tasks).await {
        let (name, collected) = result.context("bot task panicked")?;
        info!("{} finished with {} coin points", name, collected);
    }
    Ok(())
}

fn env_usize(var: &str, default: usize) -> Result<usize> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{var}={value:?} is not a number")),
        Err(_) => Ok(default),
    }
}
