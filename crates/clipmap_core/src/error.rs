//! # Build Error Types
//!
//! All errors that can occur while loading regions and building the map.

use std::path::PathBuf;

use clipmap_shared::RegionId;
use thiserror::Error;

/// Why an encrypted location payload could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The region key is missing or wrong; the payload inflates to garbage.
    #[error("invalid region key")]
    InvalidKey,

    /// The payload decrypted but did not parse.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Errors an asset provider may report for a single region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The region's data exists but could not be read.
    #[error("region {region} unreadable: {reason}")]
    Unreadable {
        /// Region that failed.
        region: RegionId,
        /// Provider-specific reason.
        reason: String,
    },

    /// The location payload was present but failed to decode.
    #[error("region {region} locations ({payload_len} bytes) failed to decode: {failure}")]
    LocationDecode {
        /// Region that failed.
        region: RegionId,
        /// Size of the raw payload in bytes.
        payload_len: usize,
        /// What went wrong.
        failure: DecodeFailure,
    },
}

/// Errors raised while parsing a location filter.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The rule file exists but could not be read.
    #[error("failed to read filter {path}: {source}")]
    Io {
        /// Rule file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A three-part rule had a component that is not an integer.
    #[error("line {line}: bad coordinate triple {text:?}")]
    BadCoordinate {
        /// 1-based line number.
        line: usize,
        /// The offending rule text.
        text: String,
    },
}

/// Errors raised while loading build configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised while decoding an exported flag payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload is not exactly one region of flag words.
    #[error("region flag payload must be {expected} bytes, got {actual}")]
    RegionLength {
        /// Required length.
        expected: usize,
        /// Received length.
        actual: usize,
    },
}

/// Fatal build failures.
///
/// Everything else (missing regions, bad placements, dropped writes) is
/// logged and counted, never returned.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A 32-byte location payload failed to decode: real corruption.
    #[error("corrupt location data in region {region}: {reason}")]
    CorruptLocations {
        /// Region that failed.
        region: RegionId,
        /// Decoder message.
        reason: DecodeFailure,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The location filter could not be loaded.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A load worker panicked.
    #[error("region load worker panicked")]
    WorkerPanicked,
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;
