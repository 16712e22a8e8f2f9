//! Protocol Messages
//!
//! JSON wire format for the three client operations. Messages are tagged
//! with a `type` field, e.g. `{"type":"move","direction":"U","name":"alice"}`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::geometry::Cell;
use crate::error::GameError;
use crate::game::movement::{MoveOutcome, MoveReport};
use crate::game::snapshot::WorldSnapshot;
use crate::game::world::GameWorld;
use crate::store::GameStore;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register a player name.
    Join {
        /// Requested name.
        name: String,
    },

    /// Move a player one cell.
    Move {
        /// `"U"`, `"R"`, `"D"` or `"L"`; anything else is ignored.
        direction: String,
        /// Player to move.
        name: String,
    },

    /// Request a world snapshot.
    State,
}

impl ClientMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Registration result.
    Joined {
        /// Requested name.
        name: String,
        /// Whether the name was accepted.
        accepted: bool,
        /// Spawn cell, when accepted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Cell>,
        /// Why the name was refused, when rejected.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A move was applied.
    Moved(MoveReport),

    /// A move with an unknown direction was dropped.
    Ignored,

    /// World snapshot.
    State(WorldSnapshot),

    /// Request failed.
    Error(ServerError),
}

impl ServerMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Move for an unregistered name.
    PlayerNotFound,
    /// The store failed; the request had no effect.
    StoreUnavailable,
    /// Persisted data could not be read.
    CorruptState,
    /// The request could not be decoded.
    BadRequest,
}

impl From<&GameError> for ServerError {
    fn from(err: &GameError) -> Self {
        let code = match err {
            GameError::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            GameError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            GameError::CorruptRecord { .. } => ErrorCode::CorruptState,
            GameError::InvalidName(_) => ErrorCode::BadRequest,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Run one client request against `world`.
pub async fn dispatch<S: GameStore>(world: &GameWorld<S>, message: ClientMessage) -> ServerMessage {
    match message {
        ClientMessage::Join { name } => match world.register(&name).await {
            Ok(position) => ServerMessage::Joined {
                name,
                accepted: true,
                position: Some(position),
                reason: None,
            },
            Err(GameError::InvalidName(rejection)) => ServerMessage::Joined {
                name,
                accepted: false,
                position: None,
                reason: Some(rejection.to_string()),
            },
            Err(err) => error_reply(&err),
        },
        ClientMessage::Move { direction, name } => {
            match world.move_player(&direction, &name).await {
                Ok(MoveOutcome::Moved(report)) => ServerMessage::Moved(report),
                Ok(MoveOutcome::Ignored) => ServerMessage::Ignored,
                Err(err) => error_reply(&err),
            }
        }
        ClientMessage::State => ServerMessage::State(world.state().await),
    }
}

/// Decode a JSON request, dispatch it and encode the reply.
pub async fn handle_json<S: GameStore>(world: &GameWorld<S>, request: &str) -> String {
    let reply = match ClientMessage::from_json(request) {
        Ok(message) => dispatch(world, message).await,
        Err(err) => ServerMessage::Error(ServerError {
            code: ErrorCode::BadRequest,
            message: err.to_string(),
        }),
    };
    reply.to_json().unwrap_or_else(|err| {
        warn!(%err, "failed to encode reply");
        r#"{"type":"error","code":"store_unavailable","message":"reply encoding failed"}"#.to_string()
    })
}

fn error_reply(err: &GameError) -> ServerMessage {
    warn!(%err, "request failed");
    ServerMessage::Error(ServerError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::store::{keys, MemoryStore};
    use std::sync::Arc;

    fn world() -> (Arc<MemoryStore>, GameWorld<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = GameConfig {
            rng_seed: Some(8),
            ..Default::default()
        };
        (store.clone(), GameWorld::new(store, config).unwrap())
    }

    #[test]
    fn test_client_message_json() {
        let msg = ClientMessage::from_json(r#"{"type":"move","direction":"U","name":"alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Move {
                direction: "U".into(),
                name: "alice".into(),
            }
        );
        assert_eq!(ClientMessage::State.to_json().unwrap(), r#"{"type":"state"}"#);
    }

    #[test]
    fn test_error_codes() {
        let error = ServerError::from(&GameError::PlayerNotFound("bob".into()));
        let json = ServerMessage::Error(error).to_json().unwrap();
        assert!(json.contains("player_not_found"));
    }

    #[tokio::test]
    async fn test_join_twice() {
        let (_, world) = world();
        let first = dispatch(&world, ClientMessage::Join { name: "alice".into() }).await;
        assert!(matches!(first, ServerMessage::Joined { accepted: true, position: Some(_), .. }));

        let second = dispatch(&world, ClientMessage::Join { name: "alice".into() }).await;
        match second {
            ServerMessage::Joined { accepted, reason, .. } => {
                assert!(!accepted);
                assert_eq!(reason.as_deref(), Some("name already used"));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_move_replies() {
        let (store, world) = world();
        store.set(&keys::player("alice"), "5,5").await.unwrap();
        store.zadd(keys::SCORES, "alice", 0).await.unwrap();
        store.hset(keys::COINS, "60,60", "1").await.unwrap();

        let reply = dispatch(
            &world,
            ClientMessage::Move {
                direction: "U".into(),
                name: "alice".into(),
            },
        )
        .await;
        match reply {
            ServerMessage::Moved(report) => assert_eq!(report.position, Cell::new(5, 4)),
            other => panic!("unexpected reply {other:?}"),
        }

        let reply = dispatch(
            &world,
            ClientMessage::Move {
                direction: "Q".into(),
                name: "alice".into(),
            },
        )
        .await;
        assert_eq!(reply, ServerMessage::Ignored);

        let reply = dispatch(
            &world,
            ClientMessage::Move {
                direction: "U".into(),
                name: "nobody".into(),
            },
        )
        .await;
        assert!(matches!(
            reply,
            ServerMessage::Error(ServerError { code: ErrorCode::PlayerNotFound, .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_json_round_trip() {
        let (_, world) = world();
        world.init().await.unwrap();

        let reply = handle_json(&world, r#"{"type":"join","name":"bob"}"#).await;
        assert!(reply.contains(r#""accepted":true"#));

        let reply = handle_json(&world, r#"{"type":"state"}"#).await;
        let parsed = ServerMessage::from_json(&reply).unwrap();
        match parsed {
            ServerMessage::State(snapshot) => {
                assert_eq!(snapshot.positions.len(), 1);
                assert_eq!(snapshot.coins.len(), 10);
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let reply = handle_json(&world, "not json").await;
        assert!(reply.contains("bad_request"));
    }
}
