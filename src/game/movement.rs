//! Movement Engine
//!
//! One call is one player tick:
//!
//! 1. Read the player's position (fails with `PlayerNotFound`).
//! 2. Step one cell in the requested direction, clamped to the board.
//! 3. Persist the new position and read the current score.
//! 4. Claim a coin on that cell, if one is there.
//! 5. Add the coin's value to the player's score.
//! 6. If that was the last coin, place a fresh layout.
//!
//! Steps 1-6 run under the player's lock, so two moves for the same player
//! never interleave. Writes are ordered from most to least reversible: the
//! position write is idempotent, the claim is undone only if the score is
//! known to be unchanged, and replenishment only happens once the pickup is
//! committed. Any failure after a claim flags the layout so a later move
//! refills an emptied board.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::core::geometry::{Cell, Direction};
use crate::error::GameError;
use crate::game::coins::CoinLayout;
use crate::game::locks::KeyedLocks;
use crate::store::{keys, GameStore};

/// Result of an applied move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    /// Player that moved.
    pub name: String,
    /// Cell after the move.
    pub position: Cell,
    /// Score after the move.
    pub score: i64,
    /// Value of the coin picked up, if any.
    pub collected: Option<u32>,
    /// Coins placed because this move took the last one.
    pub replenished: Option<usize>,
}

/// What a move request did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was applied.
    Moved(MoveReport),
    /// The direction was not one of `U`, `R`, `D`, `L`; nothing happened.
    Ignored,
}

/// Applies moves against the store.
pub struct MovementEngine<S> {
    store: Arc<S>,
    coins: Arc<CoinLayout<S>>,
    locks: KeyedLocks,
    width: i32,
    height: i32,
}

impl<S: GameStore> MovementEngine<S> {
    /// Create an engine over a `width` x `height` board.
    pub fn new(store: Arc<S>, coins: Arc<CoinLayout<S>>, width: i32, height: i32) -> Self {
        Self {
            store,
            coins,
            locks: KeyedLocks::new(),
            width,
            height,
        }
    }

    /// Apply a wire-level move. Unknown directions are silently ignored.
    pub async fn move_player(&self, direction: &str, name: &str) -> Result<MoveOutcome, GameError> {
        match Direction::parse(direction) {
            Some(direction) => self.step(direction, name).await.map(MoveOutcome::Moved),
            None => {
                debug!(direction, name, "ignoring unknown direction");
                Ok(MoveOutcome::Ignored)
            }
        }
    }

    /// Move `name` one cell in `direction`.
    #[instrument(skip(self), level = "debug")]
    pub async fn step(&self, direction: Direction, name: &str) -> Result<MoveReport, GameError> {
        let guard = self.locks.acquire(name).await;

        let key = keys::player(name);
        let Some(raw) = self.store.get(&key).await? else {
            drop(guard);
            self.locks.forget_if_idle(name).await;
            return Err(GameError::PlayerNotFound(name.to_string()));
        };
        let current: Cell = raw.parse().map_err(|_| GameError::CorruptRecord {
            key: key.clone(),
            value: raw.clone(),
        })?;

        let retried = self.retry_pending_replenish().await;

        let position = current.step(direction, self.width, self.height);
        self.store.set(&key, &position.to_string()).await?;
        let before = self.store.zscore(keys::SCORES, name).await?.unwrap_or(0);

        let claimed = match self.coins.claim(position).await {
            Ok(claimed) => claimed,
            Err(err) => {
                // The delete may have landed before the failure
                self.coins.mark_pending();
                return Err(err);
            }
        };
        let Some(value) = claimed else {
            return Ok(MoveReport {
                name: name.to_string(),
                position,
                score: before,
                collected: None,
                replenished: retried,
            });
        };

        let score = self.commit_score(name, position, value, before).await?;
        info!(name, %position, value, score, "coin collected");

        // The pickup is committed; a failed refill is retried by a later move
        let replenished = match self.coins.replenish_after_claim().await {
            Ok(placed) => placed,
            Err(err) => {
                warn!(%err, "replenishment failed, will retry");
                None
            }
        };

        Ok(MoveReport {
            name: name.to_string(),
            position,
            score,
            collected: Some(value),
            replenished: replenished.or(retried),
        })
    }

    /// Credit a claimed coin. `before` is the score read ahead of the claim.
    ///
    /// A failed increment may still have applied (timeouts), so the score is
    /// read back: the coin is returned only when the score is known to be
    /// unchanged, and kept as collected when the increment is visible.
    async fn commit_score(
        &self,
        name: &str,
        position: Cell,
        value: u32,
        before: i64,
    ) -> Result<i64, GameError> {
        let err = match self.store.zincrby(keys::SCORES, name, i64::from(value)).await {
            Ok(score) => return Ok(score),
            Err(err) => err,
        };

        let expected = before + i64::from(value);
        match self.store.zscore(keys::SCORES, name).await {
            Ok(Some(score)) if score == expected => {
                warn!(name, %err, score, "score update reported failure but applied");
                Ok(score)
            }
            Ok(score) if score.unwrap_or(0) == before => {
                warn!(name, %position, value, %err, "score update failed, returning coin");
                if let Err(restore_err) = self.coins.restore(position, value).await {
                    error!(name, %position, value, %restore_err, "coin lost: could not restore after failed score update");
                    self.coins.mark_pending();
                }
                Err(err.into())
            }
            Ok(score) => {
                error!(name, %position, value, ?score, before, "score changed unexpectedly, coin not returned");
                self.coins.mark_pending();
                Err(err.into())
            }
            Err(read_err) => {
                error!(name, %position, value, %read_err, "score state unknown, coin not returned");
                self.coins.mark_pending();
                Err(err.into())
            }
        }
    }

    async fn retry_pending_replenish(&self) -> Option<usize> {
        if !self.coins.has_pending_replenish() {
            return None;
        }
        match self.coins.retry_pending().await {
            Ok(placed) => placed,
            Err(err) => {
                warn!(%err, "pending replenishment still failing");
                None
            }
        }
    }
}
