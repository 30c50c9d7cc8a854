//! # Collision Map
//!
//! The id → [`RegionGrid`] table and the classification pass that turns
//! placements into flags.
//!
//! ## Phases
//!
//! 1. **Load**: every region id is decoded and seeded (see [`crate::loader`])
//! 2. **Classify**: every placement of every loaded region is filtered,
//!    culled and written, one at a time, in ascending region order
//!
//! ## Bilateral Writes
//!
//! A directional flag `F` written to tile `P` is always paired with
//! `flip(F)` on `P + offset(F)`. The neighbour may live in another region;
//! if that region is not loaded the write is dropped and counted.
//!
//! Classification mutates cells owned by other regions, so it never runs
//! concurrently.

use std::collections::BTreeMap;

use clipmap_shared::{Position, RegionFlag, RegionId};
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::error::BuildResult;
use crate::filter::{FilterDecision, PlacementFilter};
use crate::loader::{load_regions, LoadStats};
use crate::region::RegionGrid;
use crate::source::{
    ObjectDefinition, Placement, PlacementClass, RegionSource, TerrainData, TypeLookup, WallShape,
};

/// Tile offsets of a wall's far edge, indexed by `[diagonal][orientation]`.
const WALL_OFFSETS: [[(i32, i32); 4]; 2] = [
    [(-1, 0), (0, 1), (1, 0), (0, -1)],
    [(-1, 1), (1, 1), (1, -1), (-1, -1)],
];

/// Build counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Region ids attempted.
    pub attempted: usize,
    /// Regions in the map.
    pub loaded: usize,
    /// Regions with no data.
    pub invalid: usize,
    /// Regions the provider could not read.
    pub unreadable: usize,
    /// Loaded regions whose location payload was treated as absent.
    pub locations_absent: usize,
    /// Placements that reached type dispatch.
    pub placements_classified: usize,
    /// Placements force-cleared or force-blocked by the filter.
    pub placements_overridden: usize,
    /// Placements without a definition, type code or valid plane.
    pub placements_unknown: usize,
    /// Placements skipped as non-clipping, solid or render-culled.
    pub placements_skipped: usize,
    /// Cell writes that fell outside every loaded region.
    pub writes_dropped: usize,
}

impl From<LoadStats> for BuildStats {
    fn from(load: LoadStats) -> Self {
        Self {
            attempted: load.attempted,
            loaded: load.loaded,
            invalid: load.invalid,
            unreadable: load.unreadable,
            locations_absent: load.locations_absent,
            ..Self::default()
        }
    }
}

/// Every loaded region's collision flags.
#[derive(Debug, Default)]
pub struct CollisionMap {
    /// Loaded regions by id.
    regions: BTreeMap<RegionId, RegionGrid>,
    /// Counters from both phases.
    stats: BuildStats,
}

impl CollisionMap {
    /// Loads and classifies the world.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuildError::Config`] for an invalid config, or any
    /// fatal error from [`load_regions`].
    pub fn build<S, T, F>(source: &S, types: &T, filter: &F, config: &BuildConfig) -> BuildResult<Self>
    where
        S: RegionSource + ?Sized,
        T: TypeLookup + ?Sized,
        F: PlacementFilter + ?Sized,
    {
        config.validate()?;
        let (regions, load) = load_regions(source, config)?;
        let mut map = Self {
            regions,
            stats: BuildStats::from(load),
        };
        map.classify(types, filter);
        Ok(map)
    }

    /// [`CollisionMap::build`] with the filter named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuildError::Filter`] if the rule file is unreadable,
    /// or any error from [`CollisionMap::build`].
    pub fn build_with_config<S, T>(source: &S, types: &T, config: &BuildConfig) -> BuildResult<Self>
    where
        S: RegionSource + ?Sized,
        T: TypeLookup + ?Sized,
    {
        let filter = config.location_filter()?;
        Self::build(source, types, &filter, config)
    }

    /// Wraps preloaded grids without classifying them.
    ///
    /// Invalid grids are counted and left out.
    #[must_use]
    pub fn from_regions<I>(grids: I) -> Self
    where
        I: IntoIterator<Item = RegionGrid>,
    {
        let mut map = Self::default();
        for grid in grids {
            map.stats.attempted += 1;
            if grid.is_valid() {
                map.stats.loaded += 1;
                map.regions.insert(grid.id(), grid);
            } else {
                map.stats.invalid += 1;
            }
        }
        map
    }

    /// Writes the flags of every placement in every loaded region.
    ///
    /// Calling this twice re-applies the same writes.
    pub fn classify<T, F>(&mut self, types: &T, filter: &F)
    where
        T: TypeLookup + ?Sized,
        F: PlacementFilter + ?Sized,
    {
        let ids: Vec<RegionId> = self.regions.keys().copied().collect();
        for id in ids {
            let Some(grid) = self.regions.get_mut(&id) else {
                continue;
            };
            let placements = grid.take_placements();
            for placement in &placements {
                self.mark_placement(placement, types, filter);
            }
            if let Some(grid) = self.regions.get_mut(&id) {
                grid.restore_placements(placements);
            }
        }

        let stats = &self.stats;
        info!(
            "Classified {} placements in {} regions ({} overridden, {} skipped, {} unknown)",
            stats.placements_classified,
            self.regions.len(),
            stats.placements_overridden,
            stats.placements_skipped,
            stats.placements_unknown
        );
        debug!("Dropped {} writes outside loaded regions", stats.writes_dropped);
    }

    fn mark_placement<T, F>(&mut self, placement: &Placement, types: &T, filter: &F)
    where
        T: TypeLookup + ?Sized,
        F: PlacementFilter + ?Sized,
    {
        let origin = placement.position;
        let definitions = types.definitions(placement.id);
        let Some(def) = definitions.first() else {
            warn!("No definition for object {} at {}", placement.id, origin);
            self.stats.placements_unknown += 1;
            return;
        };
        let Some(class) = placement.class() else {
            warn!("Bad type code {} for {} at {}", placement.code, def.name, origin);
            self.stats.placements_unknown += 1;
            return;
        };
        if !origin.has_valid_plane() {
            warn!("Bad plane for {} at {}", def.name, origin);
            self.stats.placements_unknown += 1;
            return;
        }

        match filter.decide(placement, definitions) {
            FilterDecision::Allow => {}
            FilterDecision::ForceClear if placement.code <= 7 && self.is_wall_shared(placement) => {
                debug!("Keeping shared wall {} at {} type {}", def.name, origin, placement.code);
            }
            FilterDecision::ForceClear => {
                debug!("Clearing {} at {} type {}", def.name, origin, placement.code);
                self.stats.placements_overridden += 1;
                self.fill_footprint(placement, def, RegionFlag::Clear.mask());
                return;
            }
            FilterDecision::ForceBlock => {
                debug!("Blocking {} at {} type {}", def.name, origin, placement.code);
                self.stats.placements_overridden += 1;
                self.fill_footprint(placement, def, RegionFlag::Blocked.mask());
                return;
            }
        }

        if def.clip_type == 0 || def.solid {
            self.stats.placements_skipped += 1;
            return;
        }

        let Some(pos) = self.working_position(origin) else {
            self.stats.placements_skipped += 1;
            return;
        };

        self.stats.placements_classified += 1;
        match class {
            PlacementClass::GroundDecoration => {
                if def.clip_type == 1 && (def.secondary_solidity != 0 || def.blocks_ground) {
                    self.add_flags(pos, &[RegionFlag::Blocked]);
                }
            }
            PlacementClass::Occupant => {
                let (width, length) = placement.footprint(def);
                for dx in 0..width {
                    for dy in 0..length {
                        self.add_flags(
                            pos.translate(dx, dy),
                            &[RegionFlag::ObjectTile, RegionFlag::ObjectBlock],
                        );
                    }
                }
            }
            PlacementClass::Wall(shape) => self.mark_wall(pos, placement.orientation, shape),
            PlacementClass::WallDecoration => {}
        }
    }

    /// Returns true if the tile across a wall's edge already carries the
    /// opposite wall, or is not loaded.
    fn is_wall_shared(&self, placement: &Placement) -> bool {
        let flag = RegionFlag::WallWest.turn(i32::from(placement.orientation & 3));
        self.flags_at(&flag.mirror_position(placement.position))
            .map_or(true, |cell| flag.flip().test(cell))
    }

    /// Applies render-rule culling and the bridge drop.
    ///
    /// Returns `None` if the placement is culled.
    fn working_position(&self, origin: Position) -> Option<Position> {
        let grid = self.region(origin.region_id()?)?;
        let (x, y) = (origin.local_x(), origin.local_y());

        let rule = grid.render_rule(usize::from(origin.plane), x, y);
        let base = grid.render_rule(0, x, y);
        if base & TerrainData::RULE_HIDDEN != 0 && rule & TerrainData::RULE_BRIDGE == 0 {
            return None;
        }

        if grid.render_rule(1, x, y) & TerrainData::RULE_BRIDGE != 0 {
            let lowered = origin.plane.checked_sub(1)?;
            return Some(origin.with_plane(lowered));
        }
        Some(origin)
    }

    fn mark_wall(&mut self, pos: Position, orientation: u8, shape: WallShape) {
        let o = i32::from(orientation & 3);
        let mut pair = [RegionFlag::WallWest.turn(o), RegionFlag::WallBlockWest.turn(o)];
        if shape.is_diagonal() {
            pair = pair.map(|flag| flag.turn45(1));
        }
        self.add_flags(pos, &pair);

        // For straight and diagonal walls this repeats the mirror write above.
        let far = pair.map(RegionFlag::flip);
        let (dx, dy) = WALL_OFFSETS[usize::from(shape.is_diagonal())][o as usize];
        self.add_flags(pos.translate(dx, dy), &far);

        if shape == WallShape::Corner {
            let side = far.map(|flag| flag.turn(1));
            let (dx, dy) = WALL_OFFSETS[0][((o + 1) & 3) as usize];
            self.add_flags(pos.translate(dx, dy), &side);
        }
    }

    fn fill_footprint(&mut self, placement: &Placement, def: &ObjectDefinition, mask: u32) {
        let (width, length) = placement.footprint(def);
        for dx in 0..width {
            for dy in 0..length {
                let pos = placement.position.translate(dx, dy);
                if let Some(grid) = self.grid_mut(pos) {
                    grid.set_flags_at(&pos, mask);
                } else {
                    self.stats.writes_dropped += 1;
                }
            }
        }
    }

    /// ORs `flags` into `pos` and each directional flag's mirror into the
    /// tile across its edge.
    fn add_flags(&mut self, pos: Position, flags: &[RegionFlag]) {
        self.add_cell(pos, RegionFlag::union(flags));
        for flag in flags {
            if flag.is_directional() {
                self.add_cell(flag.mirror_position(pos), flag.flip().mask());
            }
        }
    }

    fn add_cell(&mut self, pos: Position, mask: u32) {
        if let Some(grid) = self.grid_mut(pos) {
            grid.add_flags_at(&pos, mask);
        } else {
            self.stats.writes_dropped += 1;
        }
    }

    fn grid_mut(&mut self, pos: Position) -> Option<&mut RegionGrid> {
        if !pos.has_valid_plane() {
            return None;
        }
        self.regions.get_mut(&pos.region_id()?)
    }

    /// Grid of a loaded region.
    #[inline]
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&RegionGrid> {
        self.regions.get(&id)
    }

    /// Loaded regions in ascending id order.
    pub fn regions(&self) -> impl Iterator<Item = &RegionGrid> + '_ {
        self.regions.values()
    }

    /// Flags at an absolute position, if its region is loaded.
    #[must_use]
    pub fn flags_at(&self, pos: &Position) -> Option<u32> {
        if !pos.has_valid_plane() {
            return None;
        }
        self.region(pos.region_id()?).map(|grid| grid.flags_at(pos))
    }

    /// Number of loaded regions.
    #[inline]
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.regions.len()
    }

    /// Build counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &BuildStats {
        &self.stats
    }
}
