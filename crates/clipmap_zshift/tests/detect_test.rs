//! # Z-Shift Detection Tests
//!
//! Ladder, shift and spiral scenarios on small hand-built regions.

use clipmap_core::{
    AllowAll, CollisionMap, MemorySource, ObjectDefinition, Placement, TerrainData, TypeTable,
    BuildConfig,
};
use clipmap_shared::{Position, RegionId};
use clipmap_zshift::{decode_links, encode_links, ZLink, ZShiftDetector};

const LADDER: u32 = 1;
const STAIRS: u32 = 2;
const SPIRAL: u32 = 3;
const SPIRAL_TOP: u32 = 4;
const STATUE: u32 = 5;
const WALL: u32 = 6;

fn types() -> TypeTable {
    TypeTable::new()
        .with(LADDER, ObjectDefinition::new("Ladder", 1, 1))
        .with(STAIRS, ObjectDefinition::new("Stairs", 2, 3))
        .with(SPIRAL, ObjectDefinition::new("Staircase", 2, 2))
        .with(SPIRAL_TOP, ObjectDefinition::new("Staircase", 1, 1))
        .with(STATUE, ObjectDefinition::new("Stairs", 3, 3))
        .with(WALL, ObjectDefinition::new("Wall", 1, 1))
}

fn region() -> RegionId {
    RegionId::from_chunks(0, 0)
}

fn build(terrain: TerrainData, placements: Vec<Placement>) -> CollisionMap {
    let mut source = MemorySource::new();
    source.insert_terrain(region(), terrain);
    source.insert_placements(region(), placements);
    let config = BuildConfig::default().with_workers(2).with_max_region(4);
    CollisionMap::build(&source, &types(), &AllowAll, &config).unwrap()
}

fn at(id: u32, orientation: u8, x: i32, y: i32, plane: u8) -> Placement {
    Placement::new(id, 10, orientation, Position::new(x, y, plane))
}

fn link(x0: i32, y0: i32, p0: u8, x1: i32, y1: i32, p1: u8) -> ZLink {
    ZLink::new(Position::new(x0, y0, p0), Position::new(x1, y1, p1))
}

/// Ground everywhere except void tiles east, north and south of (10, 10).
fn ladder_terrain() -> TerrainData {
    let mut terrain = TerrainData::with_ground(1);
    for plane in 0..2 {
        for (x, y) in [(11, 10), (10, 11), (10, 9)] {
            terrain.set_underlay(plane, x, y, 0);
        }
    }
    terrain
}

/// Test: Stacked ladders with only the west side open give one link.
#[test]
fn test_ladder_links_open_west_face() {
    let map = build(
        ladder_terrain(),
        vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1)],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    assert_eq!(links.total(), 1);
    assert_eq!(links.links(region()), &[link(9, 10, 0, 9, 10, 1)]);
}

/// Test: A wall on the west edge of the tile west of the ladders blocks the link.
#[test]
fn test_ladder_wall_blocks_face() {
    let wall = Placement::new(WALL, 0, 0, Position::new(9, 10, 0));
    let map = build(
        ladder_terrain(),
        vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1), wall],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    assert!(links.is_empty());
}

/// Test: Each cardinal face is closed by a wall on the neighbouring tile's own
/// edge in that direction, and only that face.
#[test]
fn test_ladder_faces_blocked_independently() {
    // (wall orientation, tile beside the ladders)
    let faces = [(2, (11, 10)), (3, (10, 9)), (0, (9, 10)), (1, (10, 11))];

    for (orientation, (x, y)) in faces {
        let wall = Placement::new(WALL, 0, orientation, Position::new(x, y, 1));
        let map = build(
            TerrainData::with_ground(1),
            vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1), wall],
        );

        let links = ZShiftDetector::default().detect(&map, &types());
        let region_links = links.links(region());
        assert_eq!(region_links.len(), 3, "orientation {orientation}");
        assert!(
            !region_links.contains(&link(x, y, 0, x, y, 1)),
            "orientation {orientation}"
        );
    }
}

/// Test: Without walls or void every face of a ladder pair links.
#[test]
fn test_ladder_faces_open() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1)],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    for (x, y) in [(11, 10), (10, 9), (9, 10), (10, 11)] {
        assert!(links.links(region()).contains(&link(x, y, 0, x, y, 1)), "({x}, {y})");
    }
}

/// Test: A north wall on the tile north of the ladders closes that face.
#[test]
fn test_ladder_north_wall_closes_face() {
    let mut placements = vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1)];
    for plane in 0..2 {
        placements.push(Placement::new(WALL, 0, 1, Position::new(10, 11, plane)));
    }
    let mut terrain = TerrainData::with_ground(1);
    for plane in 0..2 {
        for (x, y) in [(11, 10), (9, 10), (10, 9)] {
            terrain.set_underlay(plane, x, y, 0);
        }
    }
    let map = build(terrain, placements);

    let links = ZShiftDetector::default().detect(&map, &types());
    assert!(links.is_empty());
}

/// Test: Spiral with top and bottom sharing both axes links planes 0-1 and 1-2.
#[test]
fn test_spiral_links_below_top() {
    let map = build(
        TerrainData::with_ground(1),
        vec![
            at(SPIRAL, 0, 5, 5, 0),
            at(SPIRAL, 0, 5, 5, 1),
            at(SPIRAL_TOP, 0, 5, 5, 2),
            at(SPIRAL, 0, 5, 5, 3),
        ],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    let region_links = links.links(region());
    assert_eq!(region_links, &[link(4, 5, 0, 4, 5, 1), link(4, 5, 1, 4, 5, 2)]);
    assert!(region_links.iter().all(|l| l.upper().plane < 3));
}

/// Test: Spiral without any 1×1 piece is closed without links.
#[test]
fn test_spiral_without_top() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(SPIRAL, 0, 5, 5, 0), at(SPIRAL, 0, 5, 5, 1)],
    );

    let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types());
    assert!(links.is_empty());
    assert_eq!(stats.unmatched_groups, 1);
}

/// Test: Straight staircase stacked on the same origin links both ends.
#[test]
fn test_shift_staircase_same_origin() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(STAIRS, 0, 20, 20, 0), at(STAIRS, 0, 20, 20, 1)],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    assert_eq!(links.links(region()), &[link(20, 23, 0, 20, 19, 1)]);
}

/// Test: Top offset along the long side flips the ends.
#[test]
fn test_shift_staircase_offset_top() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(STAIRS, 0, 20, 20, 0), at(STAIRS, 0, 20, 21, 1)],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    assert_eq!(links.links(region()), &[link(20, 19, 0, 20, 23, 1)]);
}

/// Test: Rotated staircase runs along x.
#[test]
fn test_shift_staircase_rotated() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(STAIRS, 1, 20, 20, 0), at(STAIRS, 1, 20, 20, 1)],
    );

    let links = ZShiftDetector::default().detect(&map, &types());
    assert_eq!(links.links(region()), &[link(23, 20, 0, 19, 20, 1)]);
}

/// Test: Unrecognised alignment closes the group without a link.
#[test]
fn test_shift_staircase_unmatched() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(STAIRS, 0, 20, 20, 0), at(STAIRS, 0, 22, 22, 1)],
    );

    let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types());
    assert!(links.is_empty());
    assert_eq!(stats.unmatched_groups, 1);
}

/// Test: Unknown footprints are reported and skipped.
#[test]
fn test_unknown_shape_is_skipped() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(STATUE, 0, 30, 30, 0), at(STATUE, 0, 30, 30, 1)],
    );

    let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types());
    assert!(links.is_empty());
    assert_eq!(stats.unknown_shapes, 2);
    assert_eq!(stats.stairs_seen, 2);
}

/// Test: Empty regions are not scanned.
#[test]
fn test_empty_region_is_skipped() {
    let map = build(
        TerrainData::new(),
        vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1)],
    );

    let (links, stats) = ZShiftDetector::default().detect_with_stats(&map, &types());
    assert!(links.is_empty());
    assert_eq!(stats.regions_scanned, 0);
}

/// Test: Exported links decode to the detected ones.
#[test]
fn test_links_export() {
    let map = build(
        TerrainData::with_ground(1),
        vec![at(LADDER, 0, 10, 10, 0), at(LADDER, 0, 10, 10, 1)],
    );
    let links = ZShiftDetector::default().detect(&map, &types());

    for (_, region_links) in links.iter() {
        let bytes = encode_links(region_links);
        assert_eq!(bytes.len(), region_links.len() * 8);
        assert_eq!(decode_links(&bytes).unwrap(), region_links);
    }
    assert_eq!(links.total(), 4);
}
