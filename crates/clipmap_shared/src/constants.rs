//! # Grid Constants
//!
//! Dimensions of the region grid and the world it tiles.
//!
//! **CRITICAL:** These values match the decoded asset layout.
//! Changing them breaks every flag file already written.

// =============================================================================
// REGION GEOMETRY
// =============================================================================

/// Tiles along one side of a region.
pub const REGION_SIZE: usize = 64;

/// Number of stacked planes per region.
pub const PLANES: usize = 4;

/// Shift converting a world coordinate into a chunk coordinate.
pub const REGION_SHIFT: u32 = 6;

/// Mask extracting the in-region coordinate from a world coordinate.
pub const LOCAL_MASK: i32 = (REGION_SIZE as i32) - 1;

/// Cells in one region across all planes.
pub const CELLS_PER_REGION: usize = PLANES * REGION_SIZE * REGION_SIZE;

// =============================================================================
// WORLD GEOMETRY
// =============================================================================

/// Chunks along one world axis (chunk coordinates are a byte).
pub const CHUNKS_PER_AXIS: usize = 256;

/// Exclusive upper bound of world x/y coordinates.
pub const WORLD_EXTENT: i32 = (CHUNKS_PER_AXIS * REGION_SIZE) as i32;

/// Region ids scanned by a full build (chunk x below 128).
pub const MAX_REGION: u32 = 32_768;
