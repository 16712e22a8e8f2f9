//! Core primitives.
//!
//! Pure, stateless helpers shared by the store adapter and the game logic.
//! Nothing in this module performs I/O.

pub mod geometry;
pub mod hash;
pub mod rng;

// Re-export core types
pub use geometry::{clamp, permutation, random_point, Cell, Direction};
pub use hash::{SnapshotHash, SnapshotHasher};
pub use rng::GameRng;
