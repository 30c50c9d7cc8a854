//! # CLIPMAP Core
//!
//! Builds per-region collision flags from decoded terrain and object
//! placements.
//!
//! ## Pipeline
//!
//! 1. **Load**: every region id in `0..max_region` is read from a
//!    [`RegionSource`] and seeded into a [`RegionGrid`] (parallel)
//! 2. **Classify**: each placement is filtered, culled and written as
//!    bilateral flags (single-threaded)
//! 3. **Export**: non-empty regions are encoded as big-endian flag words
//!
//! ## Example
//!
//! ```rust,ignore
//! use clipmap_core::{BuildConfig, CollisionMap, MemorySource, TypeTable};
//!
//! let config = BuildConfig::load(Path::new("clipmap.toml"))?;
//! let map = CollisionMap::build_with_config(&source, &types, &config)?;
//!
//! for (grid, bytes) in clipmap_core::export::encode_map(&map) {
//!     std::fs::write(format!("{}.dat", grid.id()), bytes)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod map;
pub mod region;
pub mod source;

pub use config::BuildConfig;
pub use error::{BuildError, BuildResult, ConfigError, DecodeFailure, FilterError, PayloadError, SourceError};
pub use export::{decode_region_flags, encode_region_flags};
pub use filter::{AllowAll, FilterDecision, LocationFilter, PlacementFilter};
pub use loader::{load_region, load_regions, LoadOutcome, LoadStats};
pub use map::{BuildStats, CollisionMap};
pub use region::{FlagPlanes, RegionGrid};
pub use source::{
    MemorySource, ObjectDefinition, Placement, PlacementClass, RegionSource, TerrainData, TypeLookup,
    TypeTable, WallShape,
};
