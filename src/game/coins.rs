//! Coin Layout
//!
//! Places coins on distinct cells, claims them exactly once, and regenerates
//! the whole layout when the last coin is taken.
//!
//! Values are tiered by rank within a placement batch:
//! rank < 50 → 1, < 75 → 2, < 95 → 5, otherwise 10.
//! With the default ten coins every coin is worth 1.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::geometry::{permutation, Cell};
use crate::core::rng::GameRng;
use crate::error::{GameError, StoreError};
use crate::store::{keys, GameStore};

/// Rank thresholds and the value awarded below each.
const COIN_TIERS: [(usize, u32); 3] = [(50, 1), (75, 2), (95, 5)];

/// Value for ranks past the last tier.
const TOP_COIN_VALUE: u32 = 10;

/// Value of the coin at `rank` within a placement batch.
pub fn coin_value(rank: usize) -> u32 {
    COIN_TIERS
        .iter()
        .find(|(limit, _)| rank < *limit)
        .map(|(_, value)| *value)
        .unwrap_or(TOP_COIN_VALUE)
}

/// Whether `value` is one a placement can produce.
pub fn is_valid_coin_value(value: u32) -> bool {
    value == TOP_COIN_VALUE || COIN_TIERS.iter().any(|(_, v)| *v == value)
}

/// Pick `num_coins` distinct cells and assign tiered values.
///
/// Cells come from one permutation of the whole board, so a batch never
/// repeats a cell. `num_coins` is capped at the cell count.
pub fn plan_layout(rng: &mut GameRng, width: i32, height: i32, num_coins: usize) -> Vec<(Cell, u32)> {
    let cells = width.max(0) as usize * height.max(0) as usize;
    permutation(rng, cells)
        .into_iter()
        .take(num_coins)
        .enumerate()
        .map(|(rank, index)| (Cell::from_index(index, width), coin_value(rank)))
        .collect()
}

/// Coin layout manager over the `coins` hash.
pub struct CoinLayout<S> {
    store: Arc<S>,
    rng: Arc<Mutex<GameRng>>,
    width: i32,
    height: i32,
    num_coins: usize,
    replenish_guard: Mutex<()>,
    replenish_pending: AtomicBool,
}

impl<S: GameStore> CoinLayout<S> {
    /// Create a layout manager.
    pub fn new(
        store: Arc<S>,
        rng: Arc<Mutex<GameRng>>,
        width: i32,
        height: i32,
        num_coins: usize,
    ) -> Self {
        Self {
            store,
            rng,
            width,
            height,
            num_coins,
            replenish_guard: Mutex::new(()),
            replenish_pending: AtomicBool::new(false),
        }
    }

    /// Write a fresh batch of coins. Returns how many were placed.
    ///
    /// Overwrites the selected cells only; callers invoke it when the hash
    /// is empty.
    pub async fn place_coins(&self) -> Result<usize, StoreError> {
        let layout = {
            let mut rng = self.rng.lock().await;
            plan_layout(&mut rng, self.width, self.height, self.num_coins)
        };
        let entries: Vec<(String, String)> = layout
            .iter()
            .map(|(cell, value)| (cell.to_string(), value.to_string()))
            .collect();

        self.store.hset_many(keys::COINS, &entries).await?;
        info!(count = entries.len(), "placed coin layout");
        Ok(entries.len())
    }

    /// Place a new layout if no coins remain.
    ///
    /// Serialized by a guard and re-checked inside it, so concurrent callers
    /// that all saw the last coin go produce a single layout. Returns the
    /// number of coins placed, or `None` if coins were still present.
    pub async fn replenish_if_exhausted(&self) -> Result<Option<usize>, StoreError> {
        let _guard = self.replenish_guard.lock().await;
        if self.store.hlen(keys::COINS).await? > 0 {
            return Ok(None);
        }
        self.place_coins().await.map(Some)
    }

    /// Replenish after a successful claim.
    ///
    /// A failure is remembered so that [`Self::retry_pending`] can finish the
    /// job on a later move; otherwise an emptied board would stay empty.
    pub async fn replenish_after_claim(&self) -> Result<Option<usize>, StoreError> {
        let result = self.replenish_if_exhausted().await;
        if result.is_err() {
            self.mark_pending();
        }
        result
    }

    /// Retry a replenishment that failed earlier. No-op when none is pending.
    pub async fn retry_pending(&self) -> Result<Option<usize>, StoreError> {
        if !self.replenish_pending.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        debug!("retrying pending replenishment");
        self.replenish_after_claim().await
    }

    /// Whether a failed replenishment is waiting to be retried.
    pub fn has_pending_replenish(&self) -> bool {
        self.replenish_pending.load(Ordering::SeqCst)
    }

    /// Flag the layout for a replenishment check on the next move.
    ///
    /// Used when a claim may have removed a coin without the pickup being
    /// committed. The retry re-checks the hash, so a spurious flag is harmless.
    pub fn mark_pending(&self) {
        self.replenish_pending.store(true, Ordering::SeqCst);
    }

    /// Take the coin at `cell`, if any.
    ///
    /// The atomic delete decides the winner: when two movers race for one
    /// coin, exactly one gets `Some`. The read and the delete run under the
    /// replenish guard so a fresh layout cannot swap the coin in between.
    pub async fn claim(&self, cell: Cell) -> Result<Option<u32>, GameError> {
        let _guard = self.replenish_guard.lock().await;
        let field = cell.to_string();
        let Some(raw) = self.store.hget(keys::COINS, &field).await? else {
            return Ok(None);
        };
        if !self.store.hdel(keys::COINS, &field).await? {
            debug!(%cell, "coin already taken");
            return Ok(None);
        }
        raw.parse::<u32>().map(Some).map_err(|_| GameError::CorruptRecord {
            key: format!("{}[{}]", keys::COINS, field),
            value: raw,
        })
    }

    /// Put a claimed coin back after a failed score update.
    pub async fn restore(&self, cell: Cell, value: u32) -> Result<(), StoreError> {
        self.store
            .hset(keys::COINS, &cell.to_string(), &value.to_string())
            .await
    }

    /// Current coins by cell. Unparsable entries are skipped.
    pub async fn current(&self) -> Result<BTreeMap<Cell, u32>, StoreError> {
        let raw = self.store.hgetall(keys::COINS).await?;
        let mut coins = BTreeMap::new();
        for (field, value) in raw {
            match (field.parse::<Cell>(), value.parse::<u32>()) {
                (Ok(cell), Ok(value)) => {
                    coins.insert(cell, value);
                }
                _ => warn!(%field, %value, "skipping malformed coin entry"),
            }
        }
        Ok(coins)
    }
}
