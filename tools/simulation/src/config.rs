//! Simulation configuration
//!
//! Every world in a process should be built from the same configuration.
//! Missing keys take their defaults, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fund each new account starts with
    pub starting_fund: Decimal,
    /// Share of order notional frozen as margin
    pub margin_rate: Decimal,
    /// Seed for tick forging
    pub forge_seed: u64,
    /// Universe table, required by `SimWorld::from_config`
    pub universe_path: Option<PathBuf>,
    /// Capacity of each session's event queue
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_fund: Decimal::from(100_000),
            margin_rate: Decimal::new(1, 1),
            forge_seed: 0,
            universe_path: None,
            event_capacity: 1024,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse { reason: e.to_string() })
    }

    /// Load from TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}
