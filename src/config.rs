//! World configuration.
//!
//! Defaults match the fixed board constants. Deployments can override them
//! through `COIN_GRID_*` environment variables.

use std::time::Duration;

use crate::{HEIGHT, MAX_PLAYER_NAME_LENGTH, NUM_COINS, WIDTH};

/// Configuration for a game world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Board width in cells.
    pub width: i32,
    /// Board height in cells.
    pub height: i32,
    /// Longest accepted player name, in bytes.
    pub max_name_len: usize,
    /// Coins per layout.
    pub num_coins: usize,
    /// Upper bound for any single store call.
    pub store_timeout: Duration,
    /// Fixed RNG seed. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Capacity of the world event channel.
    pub event_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            max_name_len: MAX_PLAYER_NAME_LENGTH,
            num_coins: NUM_COINS,
            store_timeout: Duration::from_secs(2),
            rng_seed: None,
            event_capacity: 256,
        }
    }
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}={value:?} is not a valid value")]
    Unparsable {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Defaults overlaid with `COIN_GRID_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, validated.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "COIN_GRID_WIDTH")? {
            config.width = v;
        }
        if let Some(v) = parse_var(&lookup, "COIN_GRID_HEIGHT")? {
            config.height = v;
        }
        if let Some(v) = parse_var(&lookup, "COIN_GRID_MAX_NAME_LEN")? {
            config.max_name_len = v;
        }
        if let Some(v) = parse_var(&lookup, "COIN_GRID_NUM_COINS")? {
            config.num_coins = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "COIN_GRID_STORE_TIMEOUT_MS")? {
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(seed) = parse_var(&lookup, "COIN_GRID_SEED")? {
            config.rng_seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a playable world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "board must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_name_len == 0 {
            return Err(ConfigError::Invalid("max_name_len must be positive".into()));
        }
        if self.num_coins == 0 {
            return Err(ConfigError::Invalid("num_coins must be positive".into()));
        }
        if self.num_coins > self.cell_count() {
            return Err(ConfigError::Invalid(format!(
                "num_coins {} exceeds the {} cells on the board",
                self.num_coins,
                self.cell_count()
            )));
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::Invalid("store_timeout must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Number of cells on the board.
    pub fn cell_count(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { var, value }),
    }
}
