//! # Coin Grid Server
//!
//! Authoritative state manager for a real-time multiplayer grid game.
//! Players walk a bounded board, collect coins and climb a live leaderboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    COIN GRID SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure primitives                           │
//! │  ├── geometry.rs - Cells, directions, clamp, permutations    │
//! │  ├── rng.rs      - Seedable Xorshift128+ PRNG                │
//! │  └── hash.rs     - Snapshot fingerprinting                   │
//! │                                                              │
//! │  store/          - Persistent store adapter                  │
//! │  ├── keys.rs     - Key schema (player:<name>, coins, ...)    │
//! │  ├── memory.rs   - In-memory backend                         │
//! │  └── timed.rs    - Per-call timeout wrapper                  │
//! │                                                              │
//! │  game/           - State machine                             │
//! │  ├── coins.rs    - Coin layout placement and claiming        │
//! │  ├── registry.rs - Player registration                       │
//! │  ├── movement.rs - Move transition                           │
//! │  ├── snapshot.rs - Client-facing world view                  │
//! │  ├── events.rs   - World event broadcast                     │
//! │  ├── locks.rs    - Per-player mutual exclusion               │
//! │  └── world.rs    - Facade wiring it all together             │
//! │                                                              │
//! │  network/        - Transport-agnostic message boundary       │
//! │  └── protocol.rs - JSON messages and dispatch                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! The external store is the only source of truth. No in-memory mirror of
//! positions, scores or coins is kept. Moves for the same player are
//! serialized, coins are claimed with an atomic delete, and replenishment
//! runs under a guard so it happens once per exhaustion.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod network;
pub mod store;

// Re-export commonly used types
pub use config::GameConfig;
pub use core::geometry::{Cell, Direction};
pub use core::rng::GameRng;
pub use error::{GameError, NameRejection, StoreError};
pub use game::snapshot::WorldSnapshot;
pub use game::world::GameWorld;
pub use store::{GameStore, MemoryStore, TimedStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Board width in cells.
pub const WIDTH: i32 = 64;

/// Board height in cells.
pub const HEIGHT: i32 = 64;

/// Longest accepted player name, in bytes.
pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Coins placed per layout.
pub const NUM_COINS: usize = 10;
