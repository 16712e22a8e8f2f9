//! Error types.
//!
//! `StoreError` covers everything that can go wrong talking to the external
//! store. `GameError` is what the three client-facing operations return.

use std::time::Duration;

/// Failure talking to the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the call.
    #[error("store unavailable during {op}: {reason}")]
    Unavailable {
        /// Operation that failed (e.g. `"hdel"`).
        op: &'static str,
        /// Backend-specific reason.
        reason: String,
    },

    /// The call did not complete within the configured timeout.
    #[error("store call {op} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        op: &'static str,
        /// Timeout that elapsed.
        after: Duration,
    },

    /// The key holds a different structure than the call expects.
    #[error("key {key} holds the wrong kind of value")]
    WrongType {
        /// Offending key.
        key: String,
    },
}

/// Why a registration was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameRejection {
    /// Empty name.
    #[error("name is empty")]
    Empty,

    /// Name longer than the configured limit.
    #[error("name is {len} bytes, limit is {max}")]
    TooLong {
        /// Length of the rejected name in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Name was registered before.
    #[error("name already used")]
    AlreadyUsed,
}

/// Errors returned by game operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Registration refused. No state was changed.
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameRejection),

    /// Move for a name that was never registered.
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// Store failure. The operation must be treated as not applied.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// A persisted value could not be parsed.
    #[error("corrupt record at {key}: {value:?}")]
    CorruptRecord {
        /// Key (and field, for hashes) holding the value.
        key: String,
        /// Raw stored value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = GameError::PlayerNotFound("bob".into());
        assert_eq!(err.to_string(), "player not found: bob");

        let err = GameError::from(NameRejection::TooLong { len: 40, max: 32 });
        assert_eq!(err.to_string(), "invalid name: name is 40 bytes, limit is 32");

        let err = GameError::from(StoreError::Unavailable {
            op: "get",
            reason: "connection refused".into(),
        });
        assert_eq!(
            err.to_string(),
            "store unavailable during get: connection refused"
        );
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GameError>();
        assert_send_sync::<StoreError>();
    }
}
