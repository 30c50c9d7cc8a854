//! # Build Configuration
//!
//! Loaded once before a build from a TOML file.
//!
//! ```toml
//! load_workers = 4
//! max_region = 32768
//! filter_path = "filter.txt"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FilterError};
use crate::filter::LocationFilter;

/// Upper bound on load workers; the asset store does not scale past this.
pub const MAX_LOAD_WORKERS: usize = 8;

/// Exclusive upper bound on `max_region` (the id space is 16 bits).
pub const REGION_ID_SPACE: u32 = 1 << 16;

/// Build settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Threads decoding regions during the load phase.
    pub load_workers: usize,
    /// Region ids `0..max_region` are attempted.
    pub max_region: u32,
    /// Optional location filter rule file.
    pub filter_path: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            load_workers: workers.min(MAX_LOAD_WORKERS),
            max_region: clipmap_shared::MAX_REGION,
            filter_path: None,
        }
    }
}

impl BuildConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or any error
    /// from [`BuildConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "load_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_region > REGION_ID_SPACE {
            return Err(ConfigError::Invalid {
                field: "max_region",
                reason: format!("{} exceeds the id space of {REGION_ID_SPACE}", self.max_region),
            });
        }
        Ok(())
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, load_workers: usize) -> Self {
        self.load_workers = load_workers;
        self
    }

    /// Sets the region id bound.
    #[must_use]
    pub fn with_max_region(mut self, max_region: u32) -> Self {
        self.max_region = max_region;
        self
    }

    /// Sets the filter rule file.
    #[must_use]
    pub fn with_filter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.filter_path = Some(path.into());
        self
    }

    /// Loads the configured location filter, or an empty one if none is set.
    ///
    /// # Errors
    ///
    /// Returns any error from [`LocationFilter::load`].
    pub fn location_filter(&self) -> Result<LocationFilter, FilterError> {
        match &self.filter_path {
            Some(path) => LocationFilter::load(path),
            None => Ok(LocationFilter::new()),
        }
    }
}
