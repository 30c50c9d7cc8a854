//! # Region Grid
//!
//! One region's collision flags: 4 planes of 64×64 cells, each a `u32`
//! union of [`RegionFlag`] masks.
//!
//! ## Seeding
//!
//! When terrain is present every tile starts from its render rules:
//!
//! - render-rule bit 0 marks the tile `BLOCKED`, one plane lower if the
//!   plane-1 rule is a bridge (nothing is written if that lands below 0)
//! - a tile with neither overlay nor underlay is void and marked `BLOCKED`
//!
//! Region 13878 seeds plane 2's void check from plane 3. That matches the
//! shipped data and must not be "fixed".
//!
//! ## Memory Layout
//!
//! Cells are stored `[plane][x][y]`, so the flat view from
//! [`RegionGrid::flag_words`] is plane-major, x-major, y-minor.

use clipmap_shared::{Position, RegionFlag, RegionId, PLANES, REGION_SIZE};

use crate::source::{Placement, TerrainData};

/// Raw flag storage of one region.
pub type FlagPlanes = [[[u32; REGION_SIZE]; REGION_SIZE]; PLANES];

/// Region whose plane-2 void check reads plane 3.
pub const ANOMALY_REGION: RegionId = RegionId::new(13878);

/// Collision flags and placements of one region.
#[derive(Clone, Debug)]
pub struct RegionGrid {
    /// Packed region id.
    id: RegionId,
    /// Flag cells.
    flags: Box<FlagPlanes>,
    /// Terrain layers, if the region had any.
    terrain: Option<TerrainData>,
    /// Placements owned by this region.
    placements: Vec<Placement>,
    /// At least one data source was present.
    valid: bool,
}

impl RegionGrid {
    /// Builds a grid from whatever data the region has.
    ///
    /// With neither terrain nor placements the grid is invalid and all
    /// cells stay clear.
    #[must_use]
    pub fn new(id: RegionId, terrain: Option<TerrainData>, placements: Option<Vec<Placement>>) -> Self {
        let valid = terrain.is_some() || placements.is_some();
        let mut grid = Self {
            id,
            flags: Box::new([[[0; REGION_SIZE]; REGION_SIZE]; PLANES]),
            terrain,
            placements: placements.unwrap_or_default(),
            valid,
        };
        if grid.terrain.is_some() {
            grid.seed();
        }
        grid
    }

    fn seed(&mut self) {
        let blocked = RegionFlag::Blocked.mask();
        let Some(terrain) = self.terrain.as_ref() else {
            return;
        };

        for plane in 0..PLANES {
            for x in 0..REGION_SIZE {
                for y in 0..REGION_SIZE {
                    if terrain.render_rule(plane, x, y) & TerrainData::RULE_BLOCKED != 0 {
                        let bridged = terrain.render_rule(1, x, y) & TerrainData::RULE_BRIDGE != 0;
                        let target = if bridged { plane.checked_sub(1) } else { Some(plane) };
                        if let Some(target) = target {
                            self.flags[target][x][y] |= blocked;
                        }
                    }

                    let void_plane = if self.id == ANOMALY_REGION && plane == 2 { 3 } else { plane };
                    if terrain.is_void(void_plane, x, y) {
                        self.flags[void_plane][x][y] |= blocked;
                    }
                }
            }
        }
    }

    /// Region id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Returns true if terrain or placement data was present.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns true if terrain data was present.
    #[inline]
    #[must_use]
    pub const fn has_terrain(&self) -> bool {
        self.terrain.is_some()
    }

    /// Returns true if every cell on every plane is `BLOCKED`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flag_words().iter().all(|&cell| RegionFlag::Blocked.test(cell))
    }

    /// Render rule of a tile; 0 when the region has no terrain.
    #[inline]
    #[must_use]
    pub fn render_rule(&self, plane: usize, x: usize, y: usize) -> u8 {
        self.terrain
            .as_ref()
            .map_or(0, |terrain| terrain.render_rule(plane, x, y))
    }

    /// Flags of a cell.
    ///
    /// # Panics
    ///
    /// Panics if the plane or local coordinates are out of range.
    #[inline]
    #[must_use]
    pub fn flags(&self, plane: usize, x: usize, y: usize) -> u32 {
        self.flags[plane][x][y]
    }

    /// Flags of the cell at an absolute position inside this region.
    ///
    /// # Panics
    ///
    /// Panics if the plane is out of range.
    #[inline]
    #[must_use]
    pub fn flags_at(&self, pos: &Position) -> u32 {
        self.flags(usize::from(pos.plane), pos.local_x(), pos.local_y())
    }

    /// ORs `mask` into a cell.
    ///
    /// # Panics
    ///
    /// Panics if the plane or local coordinates are out of range.
    #[inline]
    pub fn add_flags(&mut self, plane: usize, x: usize, y: usize, mask: u32) {
        self.flags[plane][x][y] |= mask;
    }

    /// ORs `mask` into the cell at an absolute position.
    ///
    /// # Panics
    ///
    /// Panics if the plane is out of range.
    #[inline]
    pub fn add_flags_at(&mut self, pos: &Position, mask: u32) {
        self.add_flags(usize::from(pos.plane), pos.local_x(), pos.local_y(), mask);
    }

    /// Replaces a cell's flags with `mask`.
    ///
    /// # Panics
    ///
    /// Panics if the plane or local coordinates are out of range.
    #[inline]
    pub fn set_flags(&mut self, plane: usize, x: usize, y: usize, mask: u32) {
        self.flags[plane][x][y] = mask;
    }

    /// Replaces the flags of the cell at an absolute position.
    ///
    /// # Panics
    ///
    /// Panics if the plane is out of range.
    #[inline]
    pub fn set_flags_at(&mut self, pos: &Position, mask: u32) {
        self.set_flags(usize::from(pos.plane), pos.local_x(), pos.local_y(), mask);
    }

    /// All cells, plane-major, x-major, y-minor.
    #[must_use]
    pub fn flag_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.flags[..])
    }

    /// Nested view of all cells.
    #[inline]
    #[must_use]
    pub fn flag_planes(&self) -> &FlagPlanes {
        &self.flags
    }

    /// Placements owned by this region.
    #[inline]
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Moves the placements out so the grid can be written while they are walked.
    pub(crate) fn take_placements(&mut self) -> Vec<Placement> {
        std::mem::take(&mut self.placements)
    }

    /// Puts placements back after [`RegionGrid::take_placements`].
    pub(crate) fn restore_placements(&mut self, placements: Vec<Placement>) {
        self.placements = placements;
    }
}
