//! World Events
//!
//! Emitted after each successful mutation so a transport can push updates
//! to clients instead of polling snapshots. Publishing is fire-and-forget:
//! a lagging or absent subscriber never fails a mutation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::geometry::Cell;

/// Something that changed in the world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// A player registered and spawned.
    PlayerJoined {
        /// Player name.
        name: String,
        /// Spawn cell.
        position: Cell,
    },

    /// A player moved (with or without collecting).
    PlayerMoved {
        /// Player name.
        name: String,
        /// New cell.
        position: Cell,
        /// Score after the move.
        score: i64,
    },

    /// A player picked up a coin.
    CoinCollected {
        /// Collector.
        name: String,
        /// Cell the coin was on.
        cell: Cell,
        /// Coin value.
        value: u32,
        /// Collector's score after pickup.
        score: i64,
    },

    /// The coin layout was regenerated.
    CoinsReplenished {
        /// Coins placed.
        count: usize,
    },
}

/// Broadcast channel for [`WorldEvent`]s.
pub struct EventBus {
    tx: broadcast::Sender<WorldEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn publish(&self, event: WorldEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(WorldEvent::CoinsReplenished { count: 10 }), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(WorldEvent::PlayerJoined {
            name: "alice".into(),
            position: Cell::new(5, 5),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            WorldEvent::PlayerJoined {
                name: "alice".into(),
                position: Cell::new(5, 5),
            }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&WorldEvent::CoinCollected {
            name: "bob".into(),
            cell: Cell::new(1, 2),
            value: 5,
            score: 7,
        })
        .unwrap();
        assert!(json.contains(r#""type":"coin_collected""#));
        assert!(json.contains(r#""cell":"1,2""#));
    }
}
