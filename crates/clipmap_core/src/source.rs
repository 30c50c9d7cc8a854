//! # Asset Interfaces
//!
//! What the builder consumes from the outside world:
//!
//! - [`RegionSource`]: decoded terrain and placements per region
//! - [`TypeLookup`]: object definitions by id
//!
//! Decryption and decompression of the asset container happen behind
//! these traits. [`MemorySource`] and [`TypeTable`] are in-memory
//! implementations for fixtures, benches and embedding callers.

use std::collections::HashMap;

use clipmap_shared::{Position, RegionId, PLANES, REGION_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Per-plane terrain layers of one region.
#[derive(Clone, PartialEq, Eq)]
pub struct TerrainData {
    /// Render-rule bitfield per tile (indexed `[plane][x][y]`).
    render_rules: Box<[[[u8; REGION_SIZE]; REGION_SIZE]; PLANES]>,
    /// Overlay id per tile.
    overlays: Box<[[[u16; REGION_SIZE]; REGION_SIZE]; PLANES]>,
    /// Underlay id per tile.
    underlays: Box<[[[u16; REGION_SIZE]; REGION_SIZE]; PLANES]>,
}

impl TerrainData {
    /// Render-rule bit: the tile is blocked.
    pub const RULE_BLOCKED: u8 = 0x1;
    /// Render-rule bit: bridge tile, contents project one plane down.
    pub const RULE_BRIDGE: u8 = 0x2;
    /// Render-rule bit: the ground is hidden (roof/culled tile).
    pub const RULE_HIDDEN: u8 = 0x10;

    /// Creates an all-void terrain (every id zero, no rules).
    #[must_use]
    pub fn new() -> Self {
        Self {
            render_rules: Box::new([[[0; REGION_SIZE]; REGION_SIZE]; PLANES]),
            overlays: Box::new([[[0; REGION_SIZE]; REGION_SIZE]; PLANES]),
            underlays: Box::new([[[0; REGION_SIZE]; REGION_SIZE]; PLANES]),
        }
    }

    /// Creates terrain whose every tile on every plane has `underlay`.
    #[must_use]
    pub fn with_ground(underlay: u16) -> Self {
        let mut terrain = Self::new();
        terrain.underlays = Box::new([[[underlay; REGION_SIZE]; REGION_SIZE]; PLANES]);
        terrain
    }

    /// Render rule at a tile; 0 outside the grid.
    #[inline]
    #[must_use]
    pub fn render_rule(&self, plane: usize, x: usize, y: usize) -> u8 {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.render_rules[plane][x][y]
        } else {
            0
        }
    }

    /// Overlay id at a tile; 0 outside the grid.
    #[inline]
    #[must_use]
    pub fn overlay(&self, plane: usize, x: usize, y: usize) -> u16 {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.overlays[plane][x][y]
        } else {
            0
        }
    }

    /// Underlay id at a tile; 0 outside the grid.
    #[inline]
    #[must_use]
    pub fn underlay(&self, plane: usize, x: usize, y: usize) -> u16 {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.underlays[plane][x][y]
        } else {
            0
        }
    }

    /// Returns true if neither an overlay nor an underlay is present.
    #[inline]
    #[must_use]
    pub fn is_void(&self, plane: usize, x: usize, y: usize) -> bool {
        self.overlay(plane, x, y) == 0 && self.underlay(plane, x, y) == 0
    }

    /// Sets a render rule. Out-of-range writes are ignored.
    #[inline]
    pub fn set_render_rule(&mut self, plane: usize, x: usize, y: usize, rule: u8) {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.render_rules[plane][x][y] = rule;
        }
    }

    /// Sets an overlay id. Out-of-range writes are ignored.
    #[inline]
    pub fn set_overlay(&mut self, plane: usize, x: usize, y: usize, id: u16) {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.overlays[plane][x][y] = id;
        }
    }

    /// Sets an underlay id. Out-of-range writes are ignored.
    #[inline]
    pub fn set_underlay(&mut self, plane: usize, x: usize, y: usize, id: u16) {
        if plane < PLANES && x < REGION_SIZE && y < REGION_SIZE {
            self.underlays[plane][x][y] = id;
        }
    }
}

impl Default for TerrainData {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerrainData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let void_tiles = (0..PLANES)
            .flat_map(|p| (0..REGION_SIZE).flat_map(move |x| (0..REGION_SIZE).map(move |y| (p, x, y))))
            .filter(|&(p, x, y)| self.is_void(p, x, y))
            .count();
        f.debug_struct("TerrainData")
            .field("void_tiles", &void_tiles)
            .finish_non_exhaustive()
    }
}

/// Wall shapes (type codes 0 to 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WallShape {
    /// A straight wall along one edge.
    Straight = 0,
    /// A diagonal wall across the tile.
    Diagonal = 1,
    /// An L-shaped wall along two edges.
    Corner = 2,
    /// A diagonal corner piece.
    DiagonalCorner = 3,
}

impl WallShape {
    /// Returns true for the 45° shapes.
    #[inline]
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Self::Diagonal | Self::DiagonalCorner)
    }
}

/// How a placement's type code is classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementClass {
    /// Type codes 0 to 3.
    Wall(WallShape),
    /// Type codes 4 to 8. Writes nothing.
    WallDecoration,
    /// Type codes 9 to 21: objects occupying their footprint.
    Occupant,
    /// Type code 22.
    GroundDecoration,
}

impl PlacementClass {
    /// Highest valid type code.
    pub const MAX_CODE: u8 = 22;

    /// Classifies a raw type code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Wall(WallShape::Straight)),
            1 => Some(Self::Wall(WallShape::Diagonal)),
            2 => Some(Self::Wall(WallShape::Corner)),
            3 => Some(Self::Wall(WallShape::DiagonalCorner)),
            4..=8 => Some(Self::WallDecoration),
            9..=21 => Some(Self::Occupant),
            22 => Some(Self::GroundDecoration),
            _ => None,
        }
    }
}

/// One object instance in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Object type id.
    pub id: u32,
    /// Type code, 0 to 22.
    pub code: u8,
    /// Orientation in quarter turns, 0 to 3.
    pub orientation: u8,
    /// Position of the south-west footprint corner.
    pub position: Position,
}

impl Placement {
    /// Creates a placement.
    #[inline]
    #[must_use]
    pub const fn new(id: u32, code: u8, orientation: u8, position: Position) -> Self {
        Self {
            id,
            code,
            orientation,
            position,
        }
    }

    /// Classification of the type code.
    #[inline]
    #[must_use]
    pub const fn class(&self) -> Option<PlacementClass> {
        PlacementClass::from_code(self.code)
    }

    /// Footprint `(width, length)`, swapped for odd orientations.
    #[inline]
    #[must_use]
    pub fn footprint(&self, def: &ObjectDefinition) -> (i32, i32) {
        let (x, y) = (i32::from(def.size_x), i32::from(def.size_y));
        if self.orientation % 2 == 0 {
            (x, y)
        } else {
            (y, x)
        }
    }
}

/// Object type metadata relevant to collision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    /// Display name.
    pub name: String,
    /// Width in tiles before rotation.
    pub size_x: u8,
    /// Length in tiles before rotation.
    pub size_y: u8,
    /// Already accounted for by terrain.
    pub solid: bool,
    /// 0 = no clipping, 1 = ground-level clip, 2 = full clip.
    pub clip_type: u8,
    /// Secondary solidity attribute for ground decorations.
    pub secondary_solidity: u8,
    /// Ground decoration blocks movement.
    pub blocks_ground: bool,
}

impl ObjectDefinition {
    /// Creates a definition with full clipping and no special attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, size_x: u8, size_y: u8) -> Self {
        Self {
            name: name.into(),
            size_x,
            size_y,
            solid: false,
            clip_type: 2,
            secondary_solidity: 0,
            blocks_ground: false,
        }
    }

    /// Sets the clip type.
    #[must_use]
    pub fn with_clip_type(mut self, clip_type: u8) -> Self {
        self.clip_type = clip_type;
        self
    }

    /// Marks the definition solid.
    #[must_use]
    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    /// Sets the secondary solidity attribute.
    #[must_use]
    pub fn with_secondary_solidity(mut self, value: u8) -> Self {
        self.secondary_solidity = value;
        self
    }

    /// Marks the definition as blocking ground movement.
    #[must_use]
    pub fn with_blocks_ground(mut self, blocks: bool) -> Self {
        self.blocks_ground = blocks;
        self
    }
}

/// Type metadata lookup.
pub trait TypeLookup {
    /// Candidate definitions for an id, in priority order. Empty if unknown.
    fn definitions(&self, id: u32) -> &[ObjectDefinition];

    /// The first candidate definition.
    fn primary(&self, id: u32) -> Option<&ObjectDefinition> {
        self.definitions(id).first()
    }
}

/// Decoded-asset provider.
///
/// `Ok(None)` means the region has no such data at all.
pub trait RegionSource: Sync {
    /// Terrain layers of a region.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unreadable`] if the data exists but cannot be read.
    fn terrain(&self, region: RegionId) -> Result<Option<TerrainData>, SourceError>;

    /// Placements of a region.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::LocationDecode`] if the payload exists but did not
    /// decode, or [`SourceError::Unreadable`] if it could not be read.
    fn placements(&self, region: RegionId) -> Result<Option<Vec<Placement>>, SourceError>;
}

/// In-memory type table.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    definitions: HashMap<u32, Vec<ObjectDefinition>>,
}

impl TypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate definition for `id`.
    pub fn insert(&mut self, id: u32, def: ObjectDefinition) {
        self.definitions.entry(id).or_default().push(def);
    }

    /// Builder-style [`TypeTable::insert`].
    #[must_use]
    pub fn with(mut self, id: u32, def: ObjectDefinition) -> Self {
        self.insert(id, def);
        self
    }

    /// Number of ids with at least one definition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no ids are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl TypeLookup for TypeTable {
    fn definitions(&self, id: u32) -> &[ObjectDefinition] {
        self.definitions.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// In-memory region provider.
#[derive(Debug, Default)]
pub struct MemorySource {
    terrain: HashMap<RegionId, Result<TerrainData, SourceError>>,
    placements: HashMap<RegionId, Result<Vec<Placement>, SourceError>>,
}

impl MemorySource {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores terrain for a region.
    pub fn insert_terrain(&mut self, region: RegionId, terrain: TerrainData) {
        self.terrain.insert(region, Ok(terrain));
    }

    /// Stores the full placement list for a region.
    pub fn insert_placements(&mut self, region: RegionId, placements: Vec<Placement>) {
        self.placements.insert(region, Ok(placements));
    }

    /// Appends one placement to the region containing it.
    ///
    /// Placements outside the world are ignored.
    pub fn add_placement(&mut self, placement: Placement) {
        let Some(region) = placement.position.region_id() else {
            return;
        };
        if let Ok(list) = self.placements.entry(region).or_insert_with(|| Ok(Vec::new())) {
            list.push(placement);
        }
    }

    /// Makes terrain reads for a region fail.
    pub fn fail_terrain(&mut self, region: RegionId, error: SourceError) {
        self.terrain.insert(region, Err(error));
    }

    /// Makes placement reads for a region fail.
    pub fn fail_placements(&mut self, region: RegionId, error: SourceError) {
        self.placements.insert(region, Err(error));
    }
}

impl RegionSource for MemorySource {
    fn terrain(&self, region: RegionId) -> Result<Option<TerrainData>, SourceError> {
        self.terrain.get(&region).cloned().transpose()
    }

    fn placements(&self, region: RegionId) -> Result<Option<Vec<Placement>>, SourceError> {
        self.placements.get(&region).cloned().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_code() {
        assert_eq!(
            PlacementClass::from_code(0),
            Some(PlacementClass::Wall(WallShape::Straight))
        );
        assert_eq!(
            PlacementClass::from_code(3),
            Some(PlacementClass::Wall(WallShape::DiagonalCorner))
        );
        assert_eq!(PlacementClass::from_code(4), Some(PlacementClass::WallDecoration));
        assert_eq!(PlacementClass::from_code(8), Some(PlacementClass::WallDecoration));
        assert_eq!(PlacementClass::from_code(9), Some(PlacementClass::Occupant));
        assert_eq!(PlacementClass::from_code(21), Some(PlacementClass::Occupant));
        assert_eq!(PlacementClass::from_code(22), Some(PlacementClass::GroundDecoration));
        assert_eq!(PlacementClass::from_code(23), None);
    }

    #[test]
    fn test_footprint_swaps_on_odd_orientation() {
        let def = ObjectDefinition::new("Table", 3, 1);
        let pos = Position::new(0, 0, 0);
        assert_eq!(Placement::new(1, 10, 0, pos).footprint(&def), (3, 1));
        assert_eq!(Placement::new(1, 10, 1, pos).footprint(&def), (1, 3));
        assert_eq!(Placement::new(1, 10, 2, pos).footprint(&def), (3, 1));
        assert_eq!(Placement::new(1, 10, 3, pos).footprint(&def), (1, 3));
    }

    #[test]
    fn test_type_table_order() {
        let table = TypeTable::new()
            .with(7, ObjectDefinition::new("Door", 1, 1))
            .with(7, ObjectDefinition::new("Door (open)", 1, 1));
        assert_eq!(table.definitions(7).len(), 2);
        assert_eq!(table.primary(7).map(|d| d.name.as_str()), Some("Door"));
        assert!(table.definitions(8).is_empty());
        assert!(table.primary(8).is_none());
    }

    #[test]
    fn test_memory_source_groups_by_region() {
        let mut source = MemorySource::new();
        source.add_placement(Placement::new(1, 10, 0, Position::new(65, 3, 0)));
        source.add_placement(Placement::new(2, 10, 0, Position::new(66, 3, 0)));
        source.add_placement(Placement::new(3, 10, 0, Position::new(-5, 3, 0)));

        let region = RegionId::from_chunks(1, 0);
        let placements = source.placements(region).unwrap().unwrap();
        assert_eq!(placements.len(), 2);
        assert!(source.placements(RegionId::from_chunks(0, 0)).unwrap().is_none());
        assert!(source.terrain(region).unwrap().is_none());
    }

    #[test]
    fn test_terrain_accessors() {
        let mut terrain = TerrainData::new();
        assert!(terrain.is_void(0, 0, 0));
        terrain.set_underlay(0, 0, 0, 5);
        assert!(!terrain.is_void(0, 0, 0));
        terrain.set_render_rule(1, 2, 3, TerrainData::RULE_BRIDGE);
        assert_eq!(terrain.render_rule(1, 2, 3), 2);
        assert_eq!(terrain.render_rule(4, 2, 3), 0);
        terrain.set_overlay(9, 0, 0, 1);
        assert!(!TerrainData::with_ground(1).is_void(3, 63, 63));
    }
}
