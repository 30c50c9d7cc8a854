//! # Region Flags
//!
//! Named bits stored in every collision cell, plus the direction algebra
//! the builder uses to rotate and mirror wall edges.
//!
//! ## Layout
//!
//! Three directional groups of eight bits each (open wall, wall block,
//! allow range) and a handful of standalone object bits. `BLOCKED` is an
//! aggregate of a fixed subset and `CLEAR` is zero.
//!
//! ## Rotation
//!
//! Every flag is a row in a static table `{mask, dx, dy, group}`. Rotating
//! is an index step inside the flag's own group, so a wall never turns into
//! a wall block. Flags outside a directional group rotate to themselves.

use crate::position::Position;

/// Directional group a flag belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagGroup {
    /// Walls that stop movement across an edge.
    Wall,
    /// Walls that also stop projectiles across an edge.
    WallBlock,
    /// Edges that stop movement but let ranged attacks through.
    AllowRange,
    /// Standalone object bits.
    Object,
    /// `BLOCKED` and `CLEAR`.
    Aggregate,
}

impl FlagGroup {
    /// Ordinal of the group's north-west member, if the group is directional.
    #[inline]
    #[must_use]
    pub const fn base(self) -> Option<usize> {
        match self {
            Self::Wall => Some(0),
            Self::WallBlock => Some(9),
            Self::AllowRange => Some(20),
            Self::Object | Self::Aggregate => None,
        }
    }
}

/// One row of the flag table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FlagInfo {
    mask: u32,
    dx: i8,
    dy: i8,
    group: FlagGroup,
}

impl FlagInfo {
    const fn dir(mask: u32, dx: i8, dy: i8, group: FlagGroup) -> Self {
        Self { mask, dx, dy, group }
    }

    const fn plain(mask: u32, group: FlagGroup) -> Self {
        Self { mask, dx: 0, dy: 0, group }
    }
}

/// A named collision bit.
///
/// Discriminants are table ordinals; the directional groups list their
/// members clockwise starting at north-west.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegionFlag {
    /// Wall on the north-west corner.
    WallNorthWest = 0,
    /// Wall on the north edge.
    WallNorth,
    /// Wall on the north-east corner.
    WallNorthEast,
    /// Wall on the east edge.
    WallEast,
    /// Wall on the south-east corner.
    WallSouthEast,
    /// Wall on the south edge.
    WallSouth,
    /// Wall on the south-west corner.
    WallSouthWest,
    /// Wall on the west edge.
    WallWest,
    /// Tile is occupied by an object.
    ObjectTile,
    /// Projectile-blocking wall on the north-west corner.
    WallBlockNorthWest,
    /// Projectile-blocking wall on the north edge.
    WallBlockNorth,
    /// Projectile-blocking wall on the north-east corner.
    WallBlockNorthEast,
    /// Projectile-blocking wall on the east edge.
    WallBlockEast,
    /// Projectile-blocking wall on the south-east corner.
    WallBlockSouthEast,
    /// Projectile-blocking wall on the south edge.
    WallBlockSouth,
    /// Projectile-blocking wall on the south-west corner.
    WallBlockSouthWest,
    /// Projectile-blocking wall on the west edge.
    WallBlockWest,
    /// Object blocks projectiles.
    ObjectBlock,
    /// Decoration blocks projectiles.
    DecorationBlock,
    /// Tile is blocked by an object.
    ObjectBlocked,
    /// Range-permitting wall on the north-west corner.
    AllowRangeNorthWest,
    /// Range-permitting wall on the north edge.
    AllowRangeNorth,
    /// Range-permitting wall on the north-east corner.
    AllowRangeNorthEast,
    /// Range-permitting wall on the east edge.
    AllowRangeEast,
    /// Range-permitting wall on the south-east corner.
    AllowRangeSouthEast,
    /// Range-permitting wall on the south edge.
    AllowRangeSouth,
    /// Range-permitting wall on the south-west corner.
    AllowRangeSouthWest,
    /// Range-permitting wall on the west edge.
    AllowRangeWest,
    /// Object lets ranged attacks through.
    ObjectAllowRange,
    /// Tile is fully impassable.
    Blocked,
    /// No flags.
    Clear,
}

/// Unit offsets of the eight compass directions, clockwise from north-west.
/// North is `+y`.
const COMPASS: [(i8, i8); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
];

const fn wall(i: usize, mask: u32) -> FlagInfo {
    FlagInfo::dir(mask, COMPASS[i].0, COMPASS[i].1, FlagGroup::Wall)
}

const fn wall_block(i: usize, mask: u32) -> FlagInfo {
    FlagInfo::dir(mask, COMPASS[i].0, COMPASS[i].1, FlagGroup::WallBlock)
}

const fn allow_range(i: usize, mask: u32) -> FlagInfo {
    FlagInfo::dir(mask, COMPASS[i].0, COMPASS[i].1, FlagGroup::AllowRange)
}

/// The flag table, indexed by `RegionFlag as usize`.
const TABLE: [FlagInfo; 31] = [
    wall(0, 0x1),
    wall(1, 0x2),
    wall(2, 0x4),
    wall(3, 0x8),
    wall(4, 0x10),
    wall(5, 0x20),
    wall(6, 0x40),
    wall(7, 0x80),
    FlagInfo::plain(0x100, FlagGroup::Object),
    wall_block(0, 0x200),
    wall_block(1, 0x400),
    wall_block(2, 0x800),
    wall_block(3, 0x1000),
    wall_block(4, 0x2000),
    wall_block(5, 0x4000),
    wall_block(6, 0x8000),
    wall_block(7, 0x1_0000),
    FlagInfo::plain(0x2_0000, FlagGroup::Object),
    FlagInfo::plain(0x4_0000, FlagGroup::Object),
    FlagInfo::plain(0x20_0000, FlagGroup::Object),
    allow_range(0, 0x40_0000),
    allow_range(1, 0x80_0000),
    allow_range(2, 0x100_0000),
    allow_range(3, 0x200_0000),
    allow_range(4, 0x400_0000),
    allow_range(5, 0x800_0000),
    allow_range(6, 0x1000_0000),
    allow_range(7, 0x2000_0000),
    FlagInfo::plain(0x4000_0000, FlagGroup::Object),
    FlagInfo::plain(0x0128_0100, FlagGroup::Aggregate),
    FlagInfo::plain(0, FlagGroup::Aggregate),
];

impl RegionFlag {
    /// Every flag, in table order.
    pub const ALL: [Self; 31] = [
        Self::WallNorthWest,
        Self::WallNorth,
        Self::WallNorthEast,
        Self::WallEast,
        Self::WallSouthEast,
        Self::WallSouth,
        Self::WallSouthWest,
        Self::WallWest,
        Self::ObjectTile,
        Self::WallBlockNorthWest,
        Self::WallBlockNorth,
        Self::WallBlockNorthEast,
        Self::WallBlockEast,
        Self::WallBlockSouthEast,
        Self::WallBlockSouth,
        Self::WallBlockSouthWest,
        Self::WallBlockWest,
        Self::ObjectBlock,
        Self::DecorationBlock,
        Self::ObjectBlocked,
        Self::AllowRangeNorthWest,
        Self::AllowRangeNorth,
        Self::AllowRangeNorthEast,
        Self::AllowRangeEast,
        Self::AllowRangeSouthEast,
        Self::AllowRangeSouth,
        Self::AllowRangeSouthWest,
        Self::AllowRangeWest,
        Self::ObjectAllowRange,
        Self::Blocked,
        Self::Clear,
    ];

    /// The four cardinal wall directions, clockwise from east.
    pub const CARDINALS: [Self; 4] = [
        Self::WallEast,
        Self::WallSouth,
        Self::WallWest,
        Self::WallNorth,
    ];

    #[inline]
    const fn info(self) -> FlagInfo {
        TABLE[self as usize]
    }

    /// Raw bit mask.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.info().mask
    }

    /// Group this flag rotates within.
    #[inline]
    #[must_use]
    pub const fn group(self) -> FlagGroup {
        self.info().group
    }

    /// Returns true if the flag belongs to a directional group.
    #[inline]
    #[must_use]
    pub const fn is_directional(self) -> bool {
        self.group().base().is_some()
    }

    /// Returns true if any of this flag's bits are present in `cell`.
    #[inline]
    #[must_use]
    pub const fn test(self, cell: u32) -> bool {
        self.mask() & cell != 0
    }

    /// Rotates clockwise by `turns` × 45° within the flag's group.
    ///
    /// Negative turns rotate counter-clockwise.
    #[must_use]
    pub const fn turn45(self, turns: i32) -> Self {
        match self.group().base() {
            Some(base) => {
                let step = (self as usize - base) as i32;
                Self::ALL[base + (step + turns).rem_euclid(8) as usize]
            }
            None => self,
        }
    }

    /// Rotates clockwise by `turns` × 90°.
    #[inline]
    #[must_use]
    pub const fn turn(self, turns: i32) -> Self {
        self.turn45(turns * 2)
    }

    /// The opposite direction.
    #[inline]
    #[must_use]
    pub const fn flip(self) -> Self {
        self.turn45(4)
    }

    /// Unit vector to the tile across this edge; `(0, 0)` for
    /// non-directional flags.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        let info = self.info();
        (info.dx as i32, info.dy as i32)
    }

    /// The tile across this edge from `position`, on the same plane.
    #[inline]
    #[must_use]
    pub const fn mirror_position(self, position: Position) -> Position {
        let (dx, dy) = self.offset();
        position.translate(dx, dy)
    }

    /// Bitwise union of `flags`.
    #[must_use]
    pub fn union(flags: &[Self]) -> u32 {
        flags.iter().fold(0, |acc, flag| acc | flag.mask())
    }
}
