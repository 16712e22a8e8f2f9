//! Store key schema.
//!
//! | Key               | Structure  | Value                          |
//! |-------------------|------------|--------------------------------|
//! | `player:<name>`   | scalar     | `"x,y"`                        |
//! | `scores`          | sorted set | member = name, score = points  |
//! | `coins`           | hash       | field = `"x,y"`, value = coin  |
//! | `usednames`       | set        | member = name                  |

/// Sorted set of player scores.
pub const SCORES: &str = "scores";

/// Hash of cell to coin value.
pub const COINS: &str = "coins";

/// Set of every name ever registered.
pub const USED_NAMES: &str = "usednames";

const PLAYER_PREFIX: &str = "player:";

/// Position key for a player.
pub fn player(name: &str) -> String {
    format!("{PLAYER_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_key() {
        assert_eq!(player("alice"), "player:alice");
    }
}
