//! # Z-Shift Links
//!
//! A link joins the same or nearby tiles on two planes and is walkable in
//! both directions.
//!
//! ## Wire Format
//!
//! Each link is two big-endian words, lower tile first, each packed as
//! `(x << 17) | (y << 2) | plane`. A region's payload is its links back to
//! back with no header.

use std::collections::BTreeMap;
use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use clipmap_shared::{Position, RegionId};

use crate::error::LinkDecodeError;

/// Bytes per encoded link.
pub const LINK_LEN: usize = 8;

/// A traversal edge between two planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZLink {
    lower: Position,
    upper: Position,
}

impl ZLink {
    /// Creates a link, ordering the ends by plane.
    #[inline]
    #[must_use]
    pub const fn new(a: Position, b: Position) -> Self {
        if a.plane <= b.plane {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    /// End on the lower plane.
    #[inline]
    #[must_use]
    pub const fn lower(&self) -> Position {
        self.lower
    }

    /// End on the upper plane.
    #[inline]
    #[must_use]
    pub const fn upper(&self) -> Position {
        self.upper
    }

    /// Region the link is filed under (the lower tile's).
    #[inline]
    #[must_use]
    pub const fn region_id(&self) -> Option<RegionId> {
        self.lower.region_id()
    }
}

impl fmt::Display for ZLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.lower, self.upper)
    }
}

/// Links grouped by region, in discovery order within a region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZLinkMap {
    links: BTreeMap<RegionId, Vec<ZLink>>,
}

impl ZLinkMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a link under its region.
    ///
    /// Returns false if the link is a duplicate or lies outside the world.
    pub fn insert(&mut self, link: ZLink) -> bool {
        let Some(region) = link.region_id() else {
            return false;
        };
        let list = self.links.entry(region).or_default();
        if list.contains(&link) {
            return false;
        }
        list.push(link);
        true
    }

    /// Links of one region; empty if it has none.
    #[must_use]
    pub fn links(&self, region: RegionId) -> &[ZLink] {
        self.links.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Regions with links, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &[ZLink])> + '_ {
        self.links.iter().map(|(id, links)| (*id, links.as_slice()))
    }

    /// Number of links across all regions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }

    /// Number of regions with at least one link.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.links.len()
    }

    /// Returns true if no links were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Encodes links as big-endian packed words.
#[must_use]
pub fn encode_links(links: &[ZLink]) -> Vec<u8> {
    let words: Vec<u32> = links
        .iter()
        .flat_map(|link| [link.lower.pack(), link.upper.pack()])
        .collect();
    let mut out = vec![0u8; words.len() * 4];
    BigEndian::write_u32_into(&words, &mut out);
    out
}

/// Decodes a payload written by [`encode_links`].
///
/// # Errors
///
/// Returns [`LinkDecodeError::Length`] if the payload is not a whole number
/// of links.
pub fn decode_links(bytes: &[u8]) -> Result<Vec<ZLink>, LinkDecodeError> {
    if bytes.len() % LINK_LEN != 0 {
        return Err(LinkDecodeError::Length { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(LINK_LEN)
        .map(|chunk| {
            ZLink::new(
                Position::unpack(BigEndian::read_u32(&chunk[..4])),
                Position::unpack(BigEndian::read_u32(&chunk[4..])),
            )
        })
        .collect())
}
