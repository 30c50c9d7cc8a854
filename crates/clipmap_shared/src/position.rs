//! # World Coordinates
//!
//! Absolute tile positions and the packed region ids that own them.
//!
//! ## Region Ids
//!
//! A region is a 64×64 chunk of the world. Its id packs the chunk
//! coordinates as `(chunk_x << 8) | chunk_y`, so both halves are a byte and
//! the id round-trips losslessly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{LOCAL_MASK, PLANES, REGION_SHIFT, REGION_SIZE, WORLD_EXTENT};

/// Packed region identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(u16);

impl RegionId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Packs chunk coordinates into an id.
    #[inline]
    #[must_use]
    pub const fn from_chunks(chunk_x: u8, chunk_y: u8) -> Self {
        Self(((chunk_x as u16) << 8) | chunk_y as u16)
    }

    /// Region containing world tile `(x, y)`.
    ///
    /// Returns `None` outside the addressable world.
    #[inline]
    #[must_use]
    pub const fn containing(x: i32, y: i32) -> Option<Self> {
        if x < 0 || y < 0 || x >= WORLD_EXTENT || y >= WORLD_EXTENT {
            return None;
        }
        Some(Self::from_chunks(
            (x >> REGION_SHIFT) as u8,
            (y >> REGION_SHIFT) as u8,
        ))
    }

    /// Raw packed value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Chunk x coordinate.
    #[inline]
    #[must_use]
    pub const fn chunk_x(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Chunk y coordinate.
    #[inline]
    #[must_use]
    pub const fn chunk_y(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// World x of the region's south-west corner.
    #[inline]
    #[must_use]
    pub const fn base_x(self) -> i32 {
        (self.chunk_x() as i32) << REGION_SHIFT
    }

    /// World y of the region's south-west corner.
    #[inline]
    #[must_use]
    pub const fn base_y(self) -> i32 {
        (self.chunk_y() as i32) << REGION_SHIFT
    }

    /// Absolute position of a local tile in this region.
    #[inline]
    #[must_use]
    pub const fn position(self, plane: u8, local_x: usize, local_y: usize) -> Position {
        Position::new(
            self.base_x() + local_x as i32,
            self.base_y() + local_y as i32,
            plane,
        )
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chunk_x(), self.chunk_y())
    }
}

/// Absolute tile position.
///
/// Coordinates are signed so that stepping off the world edge yields a
/// position with no region instead of wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// World x (east).
    pub x: i32,
    /// World y (north).
    pub y: i32,
    /// Plane, 0 to 3.
    pub plane: u8,
}

impl Position {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, plane: u8) -> Self {
        Self { x, y, plane }
    }

    /// Same plane, shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.plane)
    }

    /// Same tile on another plane.
    #[inline]
    #[must_use]
    pub const fn with_plane(self, plane: u8) -> Self {
        Self::new(self.x, self.y, plane)
    }

    /// Owning region, if the tile is inside the world.
    #[inline]
    #[must_use]
    pub const fn region_id(self) -> Option<RegionId> {
        RegionId::containing(self.x, self.y)
    }

    /// X within the owning region.
    #[inline]
    #[must_use]
    pub const fn local_x(self) -> usize {
        (self.x & LOCAL_MASK) as usize
    }

    /// Y within the owning region.
    #[inline]
    #[must_use]
    pub const fn local_y(self) -> usize {
        (self.y & LOCAL_MASK) as usize
    }

    /// Returns true if the plane is one of the four stored planes.
    #[inline]
    #[must_use]
    pub const fn has_valid_plane(self) -> bool {
        (self.plane as usize) < PLANES
    }

    /// Packs into a link word: `(x << 17) | (y << 2) | plane`.
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u32 {
        ((self.x as u32) << 17) | ((self.y as u32) << 2) | (self.plane as u32 & 0x3)
    }

    /// Inverse of [`Position::pack`].
    #[inline]
    #[must_use]
    pub const fn unpack(word: u32) -> Self {
        Self::new(
            (word >> 17) as i32,
            ((word >> 2) & 0x7FFF) as i32,
            (word & 0x3) as u8,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// Returns true if `(local_x, local_y)` addresses a cell inside a region.
#[inline]
#[must_use]
pub const fn in_region(local_x: usize, local_y: usize) -> bool {
    local_x < REGION_SIZE && local_y < REGION_SIZE
}
