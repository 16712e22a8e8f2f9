//! World Snapshot
//!
//! Read-only view for clients: where everyone is, the leaderboard, and the
//! coins still on the board. Reads are best effort. A part that cannot be
//! read is left empty and the snapshot is flagged incomplete instead of
//! failing the request. The view is not linearized with moves in flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::geometry::Cell;
use crate::core::hash::{SnapshotHash, SnapshotHasher};
use crate::game::coins::CoinLayout;
use crate::store::{keys, GameStore};

/// A player's position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPosition {
    /// Player name.
    pub name: String,
    /// Current cell.
    pub position: Cell,
}

/// A leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name.
    pub name: String,
    /// Points collected.
    pub score: i64,
}

/// Client-facing view of the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Positions, ordered by name.
    pub positions: Vec<PlayerPosition>,
    /// Scores, highest first; ties ordered by name.
    pub scores: Vec<ScoreEntry>,
    /// Uncollected coins by cell.
    pub coins: BTreeMap<Cell, u32>,
    /// When the snapshot was assembled.
    pub taken_at: DateTime<Utc>,
    /// `false` if some part could not be read.
    pub complete: bool,
}

impl WorldSnapshot {
    /// Fingerprint of positions, scores and coins (not the timestamp).
    pub fn digest(&self) -> SnapshotHash {
        let mut hasher = SnapshotHasher::for_snapshot();

        hasher.update_u32(self.positions.len() as u32);
        for entry in &self.positions {
            hasher.update_str(&entry.name);
            hasher.update_i32(entry.position.x);
            hasher.update_i32(entry.position.y);
        }

        hasher.update_u32(self.scores.len() as u32);
        for entry in &self.scores {
            hasher.update_str(&entry.name);
            hasher.update_i64(entry.score);
        }

        hasher.update_u32(self.coins.len() as u32);
        for (cell, value) in &self.coins {
            hasher.update_i32(cell.x);
            hasher.update_i32(cell.y);
            hasher.update_u32(*value);
        }

        hasher.finalize()
    }

    /// Whether two snapshots show the same world, ignoring when they were taken.
    pub fn same_world(&self, other: &Self) -> bool {
        self.positions == other.positions && self.scores == other.scores && self.coins == other.coins
    }

    /// Top of the leaderboard.
    pub fn leader(&self) -> Option<&ScoreEntry> {
        self.scores.first()
    }

    /// Position of `name`, if present.
    pub fn position_of(&self, name: &str) -> Option<Cell> {
        self.positions
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.position)
    }

    /// Score of `name`, if present.
    pub fn score_of(&self, name: &str) -> Option<i64> {
        self.scores
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.score)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Assembles [`WorldSnapshot`]s from the store.
pub struct SnapshotBuilder<S> {
    store: Arc<S>,
    coins: Arc<CoinLayout<S>>,
}

impl<S: GameStore> SnapshotBuilder<S> {
    /// Create a builder.
    pub fn new(store: Arc<S>, coins: Arc<CoinLayout<S>>) -> Self {
        Self { store, coins }
    }

    /// Read the current world. Never fails; see [`WorldSnapshot::complete`].
    pub async fn state(&self) -> WorldSnapshot {
        let mut complete = true;

        let scores: Vec<ScoreEntry> = match self.store.zrevrange_withscores(keys::SCORES).await {
            Ok(rows) => {
                let mut rows: Vec<ScoreEntry> = rows
                    .into_iter()
                    .map(|(name, score)| ScoreEntry { name, score })
                    .collect();
                // Backends disagree on tie order; pin it to name
                rows.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
                rows
            }
            Err(err) => {
                warn!(%err, "snapshot: leaderboard unavailable");
                complete = false;
                Vec::new()
            }
        };

        let positions = match self.read_positions(&scores).await {
            Some(positions) => positions,
            None => {
                complete = false;
                Vec::new()
            }
        };

        let coins = match self.coins.current().await {
            Ok(coins) => coins,
            Err(err) => {
                warn!(%err, "snapshot: coin layout unavailable");
                complete = false;
                BTreeMap::new()
            }
        };

        WorldSnapshot {
            positions,
            scores,
            coins,
            taken_at: Utc::now(),
            complete,
        }
    }

    async fn read_positions(&self, scores: &[ScoreEntry]) -> Option<Vec<PlayerPosition>> {
        if scores.is_empty() {
            return Some(Vec::new());
        }

        let player_keys: Vec<String> = scores.iter().map(|entry| keys::player(&entry.name)).collect();
        let raw = match self.store.mget(&player_keys).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "snapshot: positions unavailable");
                return None;
            }
        };

        let mut positions: Vec<PlayerPosition> = scores
            .iter()
            .zip(raw)
            .filter_map(|(entry, value)| {
                let parsed = value.as_deref().map(str::parse::<Cell>);
                match parsed {
                    Some(Ok(position)) => Some(PlayerPosition {
                        name: entry.name.clone(),
                        position,
                    }),
                    Some(Err(_)) => {
                        warn!(name = %entry.name, "snapshot: skipping corrupt position");
                        None
                    }
                    None => {
                        debug!(name = %entry.name, "snapshot: player has no position yet");
                        None
                    }
                }
            })
            .collect();
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        Some(positions)
    }
}
