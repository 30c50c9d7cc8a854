//! # Z-Shift Detector
//!
//! Infers plane links from stair-like placements in a finished map.
//!
//! ## Per Region
//!
//! Stair-like placements are visited in region order. Each open one seeds
//! a group: the open placements sharing the seed's name whose origin lies
//! inside the seed footprint (far edge inclusive). The group is solved by
//! shape and closed, so it never seeds or joins again.
//!
//! | Shape | Solver |
//! |-------|--------|
//! | 1×1 | ladder: check the four faces on both planes |
//! | 2×3, 2×4, 3×2, 4×2, 3×1, 1×3 | shift: near end to far end |
//! | 2×2 | spiral: fixed landing tile beside the bottom piece |
//!
//! The map is only read, so regions could be solved in parallel; they are
//! not, since detection is a small fraction of a build.

use std::collections::HashSet;

use clipmap_core::{CollisionMap, ObjectDefinition, Placement, TypeLookup};
use clipmap_shared::{Position, RegionFlag};
use tracing::{debug, info, warn};

use crate::config::ZShiftConfig;
use crate::link::{ZLink, ZLinkMap};
use crate::shape::StairShape;

/// Detection counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectStats {
    /// Non-empty regions scanned.
    pub regions_scanned: usize,
    /// Stair-like placements seen.
    pub stairs_seen: usize,
    /// Seeds with an unrecognised footprint.
    pub unknown_shapes: usize,
    /// Groups closed without a link.
    pub unmatched_groups: usize,
}

/// Finds plane links in a collision map.
#[derive(Clone, Debug)]
pub struct ZShiftDetector {
    stair_names: HashSet<String>,
}

impl Default for ZShiftDetector {
    fn default() -> Self {
        Self::new(&ZShiftConfig::default())
    }
}

impl ZShiftDetector {
    /// Creates a detector for the configured stair names.
    #[must_use]
    pub fn new(config: &ZShiftConfig) -> Self {
        Self {
            stair_names: config.stair_names.iter().cloned().collect(),
        }
    }

    /// Returns true if any candidate definition has a stair name.
    #[must_use]
    pub fn is_stairs(&self, definitions: &[ObjectDefinition]) -> bool {
        definitions.iter().any(|def| self.stair_names.contains(&def.name))
    }

    /// Detects links in every non-empty region.
    #[must_use]
    pub fn detect<T>(&self, map: &CollisionMap, types: &T) -> ZLinkMap
    where
        T: TypeLookup + ?Sized,
    {
        self.detect_with_stats(map, types).0
    }

    /// [`ZShiftDetector::detect`], also returning counters.
    #[must_use]
    pub fn detect_with_stats<T>(&self, map: &CollisionMap, types: &T) -> (ZLinkMap, DetectStats)
    where
        T: TypeLookup + ?Sized,
    {
        let mut links = ZLinkMap::new();
        let mut stats = DetectStats::default();

        for grid in map.regions() {
            if grid.is_empty() {
                continue;
            }
            stats.regions_scanned += 1;

            let stairs: Vec<Placement> = grid
                .placements()
                .iter()
                .filter(|p| {
                    p.position.has_valid_plane() && self.is_stairs(types.definitions(p.id))
                })
                .copied()
                .collect();
            if stairs.is_empty() {
                continue;
            }
            stats.stairs_seen += stairs.len();

            let mut pass = RegionPass {
                map,
                types,
                closed: vec![false; stairs.len()],
                stairs: &stairs,
                links: &mut links,
                stats: &mut stats,
            };
            for seed in 0..stairs.len() {
                if !pass.closed[seed] {
                    pass.solve(seed);
                }
            }
        }

        info!(
            "Detected {} z-shift links in {} regions ({} stairs, {} unknown shapes, {} unmatched)",
            links.total(),
            links.region_count(),
            stats.stairs_seen,
            stats.unknown_shapes,
            stats.unmatched_groups
        );
        (links, stats)
    }
}

/// Solver state for one region.
struct RegionPass<'a, T: ?Sized> {
    map: &'a CollisionMap,
    types: &'a T,
    stairs: &'a [Placement],
    closed: Vec<bool>,
    links: &'a mut ZLinkMap,
    stats: &'a mut DetectStats,
}

impl<T> RegionPass<'_, T>
where
    T: TypeLookup + ?Sized,
{
    fn solve(&mut self, seed: usize) {
        let placement = self.stairs[seed];
        let types = self.types;
        let Some(def) = types.primary(placement.id) else {
            return;
        };

        match StairShape::classify(def.size_x, def.size_y) {
            Some(StairShape::Spiral) => self.solve_spiral(seed, def),
            Some(StairShape::Shift) => self.solve_shift(seed, def),
            Some(StairShape::Ladder) => self.solve_ladder(seed, def),
            None => {
                warn!(
                    "Unknown stair shape {} at {} size {}x{}",
                    def.name, placement.position, def.size_x, def.size_y
                );
                self.stats.unknown_shapes += 1;
            }
        }
    }

    /// Open placements named like the seed with an origin inside its footprint.
    fn group(&self, seed: usize, def: &ObjectDefinition) -> Vec<usize> {
        let placement = self.stairs[seed];
        let origin = placement.position;
        let (width, length) = placement.footprint(def);

        (0..self.stairs.len())
            .filter(|&i| !self.closed[i])
            .filter(|&i| {
                let pos = self.stairs[i].position;
                (origin.x..=origin.x + width).contains(&pos.x)
                    && (origin.y..=origin.y + length).contains(&pos.y)
            })
            .filter(|&i| {
                self.types
                    .definitions(self.stairs[i].id)
                    .iter()
                    .any(|candidate| candidate.name == def.name)
            })
            .collect()
    }

    fn close(&mut self, members: &[usize]) {
        for &i in members {
            self.closed[i] = true;
        }
    }

    fn add_link(&mut self, link: ZLink) {
        if self.links.insert(link) {
            debug!("Z-shift link {}", link);
        }
    }

    fn solve_ladder(&mut self, seed: usize, def: &ObjectDefinition) {
        let group = self.group(seed, def);

        for &i in &group {
            for &j in &group {
                let upper = self.stairs[i].position;
                let lower = self.stairs[j].position;
                if i == j || lower.plane.checked_add(1) != Some(upper.plane) {
                    continue;
                }
                for face in RegionFlag::CARDINALS {
                    if let Some(link) = self.ladder_face(upper, lower, face) {
                        self.add_link(link);
                    }
                }
            }
        }

        self.close(&group);
    }

    /// Checks the tiles beside two stacked ladders in direction `face`.
    ///
    /// A tile is rejected if blocked or walled on its own `face` edge.
    fn ladder_face(&self, upper: Position, lower: Position, face: RegionFlag) -> Option<ZLink> {
        let (dx, dy) = face.offset();
        let top = upper.translate(dx, dy);
        let bottom = lower.translate(dx, dy);

        let top_flags = self.map.flags_at(&top)?;
        let bottom_flags = self.map.flags_at(&bottom)?;
        let open = |cell: u32| !RegionFlag::Blocked.test(cell) && !face.test(cell);

        (open(top_flags) && open(bottom_flags)).then(|| ZLink::new(bottom, top))
    }

    fn solve_shift(&mut self, seed: usize, def: &ObjectDefinition) {
        let placement = self.stairs[seed];
        let p = placement.position;
        let (width, length) = placement.footprint(def);
        let len = if width == 2 { length } else { width };

        let group = self.group(seed, def);
        let mut top = p;
        for &i in &group {
            let pos = self.stairs[i].position;
            if pos.plane > top.plane {
                top = pos;
            }
        }

        let ends = if top.plane == p.plane {
            None
        } else if top.x == p.x && top.y == p.y {
            if width == 2 {
                Some((
                    Position::new(p.x, p.y + len, p.plane),
                    Position::new(p.x, p.y - 1, top.plane),
                ))
            } else {
                Some((
                    Position::new(p.x + len, p.y, p.plane),
                    Position::new(p.x - 1, p.y, top.plane),
                ))
            }
        } else if top.x == p.x && top.y - (len - 2) == p.y {
            Some((
                Position::new(p.x, p.y - 1, p.plane),
                Position::new(p.x, p.y + len, top.plane),
            ))
        } else if top.x - (len - 2) == p.x && top.y == p.y {
            Some((
                Position::new(p.x - 1, p.y, p.plane),
                Position::new(p.x + len, p.y, top.plane),
            ))
        } else {
            None
        };

        match ends {
            Some((near, far)) => self.add_link(ZLink::new(near, far)),
            None => {
                warn!("Unmatched staircase {} at {} (top {})", def.name, p, top);
                self.stats.unmatched_groups += 1;
            }
        }

        self.close(&group);
    }

    fn solve_spiral(&mut self, seed: usize, def: &ObjectDefinition) {
        let group = self.group(seed, def);

        // The lowest 1×1 piece is the spiral's top landing.
        let mut top: Option<Position> = None;
        let mut bottom: Option<Position> = None;
        for stair in self.stairs {
            let Some(stair_def) = self.types.primary(stair.id) else {
                continue;
            };
            let pos = stair.position;
            let slot = if (stair_def.size_x, stair_def.size_y) == (1, 1) {
                &mut top
            } else {
                &mut bottom
            };
            if slot.map_or(true, |current| pos.plane < current.plane) {
                *slot = Some(pos);
            }
        }

        let (Some(top), Some(bottom)) = (top, bottom) else {
            warn!("Unable to find top for spiral {} at {}", def.name, self.stairs[seed].position);
            self.stats.unmatched_groups += 1;
            self.close(&group);
            return;
        };

        let members: Vec<usize> = group
            .into_iter()
            .filter(|&i| self.stairs[i].position.plane <= top.plane)
            .collect();
        self.close(&members);

        let (translation, step) = match (top.x == bottom.x, top.y == bottom.y) {
            (true, true) => ((0, -1), (-1, 1)),
            (true, false) => ((-1, 1), (1, 1)),
            (false, true) => ((2, 0), (-1, 0)),
            (false, false) => ((1, 2), (1, -1)),
        };
        let x = bottom.x + translation.0 + step.0;
        let y = bottom.y + translation.1 + step.1;

        for &i in &members {
            for &j in &members {
                let lower = self.stairs[i].position.plane;
                let upper = self.stairs[j].position.plane;
                if i != j && lower.checked_add(1) == Some(upper) {
                    self.add_link(ZLink::new(
                        Position::new(x, y, lower),
                        Position::new(x, y, upper),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmap_core::{AllowAll, RegionGrid, TerrainData, TypeTable};
    use clipmap_shared::RegionId;

    const LADDER: u32 = 1;
    const TRAPDOOR: u32 = 2;

    fn map_with(placements: Vec<Placement>, types: &TypeTable) -> CollisionMap {
        let grid = RegionGrid::new(
            RegionId::from_chunks(0, 0),
            Some(TerrainData::with_ground(1)),
            Some(placements),
        );
        let mut map = CollisionMap::from_regions(vec![grid]);
        map.classify(types, &AllowAll);
        map
    }

    fn ladder(x: i32, y: i32, plane: u8) -> Placement {
        Placement::new(LADDER, 10, 0, Position::new(x, y, plane))
    }

    #[test]
    fn test_is_stairs_checks_every_candidate() {
        let detector = ZShiftDetector::default();
        assert!(detector.is_stairs(&[
            ObjectDefinition::new("Door", 1, 1),
            ObjectDefinition::new("Ladder", 1, 1),
        ]));
        assert!(!detector.is_stairs(&[ObjectDefinition::new("Trapdoor", 1, 1)]));

        let custom = ZShiftDetector::new(&ZShiftConfig {
            stair_names: vec!["Trapdoor".to_string()],
        });
        assert!(custom.is_stairs(&[ObjectDefinition::new("Trapdoor", 1, 1)]));
    }

    #[test]
    fn test_open_ladder_links_every_face() {
        let types = TypeTable::new().with(LADDER, ObjectDefinition::new("Ladder", 1, 1));
        let map = map_with(vec![ladder(10, 10, 0), ladder(10, 10, 1)], &types);

        let links = ZShiftDetector::default().detect(&map, &types);
        let region = links.links(RegionId::from_chunks(0, 0));
        assert_eq!(
            region,
            &[
                ZLink::new(Position::new(11, 10, 0), Position::new(11, 10, 1)),
                ZLink::new(Position::new(10, 9, 0), Position::new(10, 9, 1)),
                ZLink::new(Position::new(9, 10, 0), Position::new(9, 10, 1)),
                ZLink::new(Position::new(10, 11, 0), Position::new(10, 11, 1)),
            ]
        );
    }

    #[test]
    fn test_unconfigured_names_are_ignored() {
        let types = TypeTable::new().with(TRAPDOOR, ObjectDefinition::new("Trapdoor", 1, 1));
        let placements = vec![
            Placement::new(TRAPDOOR, 10, 0, Position::new(5, 5, 0)),
            Placement::new(TRAPDOOR, 10, 0, Position::new(5, 5, 1)),
        ];
        let map = map_with(placements, &types);

        let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types);
        assert!(links.is_empty());
        assert_eq!(stats.stairs_seen, 0);
        assert_eq!(stats.regions_scanned, 1);
    }

    #[test]
    fn test_stairs_off_the_plane_range_are_ignored() {
        const TOP: u32 = 3;
        let types = TypeTable::new()
            .with(LADDER, ObjectDefinition::new("Staircase", 2, 2))
            .with(TOP, ObjectDefinition::new("Staircase", 1, 1));
        let placements = vec![
            Placement::new(LADDER, 10, 0, Position::new(5, 5, 3)),
            Placement::new(TOP, 10, 0, Position::new(5, 5, 4)),
        ];
        let map = map_with(placements, &types);

        let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types);
        assert!(links.is_empty());
        assert_eq!(stats.stairs_seen, 1);
        assert_eq!(stats.unmatched_groups, 1);
    }

    #[test]
    fn test_same_plane_shift_is_unmatched() {
        let types = TypeTable::new().with(LADDER, ObjectDefinition::new("Stairs", 2, 3));
        let map = map_with(vec![Placement::new(LADDER, 10, 0, Position::new(20, 20, 0))], &types);

        let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types);
        assert!(links.is_empty());
        assert_eq!(stats.unmatched_groups, 1);
    }
}
