//! # Detector Configuration
//!
//! ```toml
//! stair_names = ["Stairs", "Staircase", "Ladder"]
//! ```

use clipmap_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Object names treated as stairs when none are configured.
pub const DEFAULT_STAIR_NAMES: [&str; 3] = ["Stairs", "Staircase", "Ladder"];

/// Detector settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZShiftConfig {
    /// Definition names that mark a placement as stair-like.
    pub stair_names: Vec<String>,
}

impl Default for ZShiftConfig {
    fn default() -> Self {
        Self {
            stair_names: DEFAULT_STAIR_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ZShiftConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, or
    /// [`ConfigError::Invalid`] if no stair names remain.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.stair_names.is_empty() {
            return Err(ConfigError::Invalid {
                field: "stair_names",
                reason: "at least one name is required".to_string(),
            });
        }
        Ok(config)
    }
}
