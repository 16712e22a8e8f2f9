//! Game Logic Module
//!
//! The state machine over the store. All state lives in the store; these
//! types hold only handles, locks and the RNG.
//!
//! ## Module Structure
//!
//! - `coins`: Coin layout placement, claiming, replenishment
//! - `registry`: Player registration
//! - `movement`: Move transition
//! - `snapshot`: Client-facing world view
//! - `events`: World event broadcast
//! - `locks`: Per-player mutual exclusion
//! - `world`: Facade over all of the above

pub mod coins;
pub mod events;
pub mod locks;
pub mod movement;
pub mod registry;
pub mod snapshot;
pub mod world;

// Re-export key types
pub use coins::{coin_value, CoinLayout};
pub use events::WorldEvent;
pub use movement::{MoveOutcome, MoveReport};
pub use snapshot::{PlayerPosition, ScoreEntry, WorldSnapshot};
pub use world::GameWorld;
