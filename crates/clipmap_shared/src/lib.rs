//! # CLIPMAP Shared
//!
//! Types used by both the collision map builder and the z-shift detector.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER:
//! - touch the filesystem
//! - spawn threads
//! - depend on the asset provider
//!
//! If you need any of that, put it in `clipmap_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod flags;
pub mod position;

pub use constants::{CELLS_PER_REGION, MAX_REGION, PLANES, REGION_SIZE, WORLD_EXTENT};
pub use flags::{FlagGroup, RegionFlag};
pub use position::{in_region, Position, RegionId};
