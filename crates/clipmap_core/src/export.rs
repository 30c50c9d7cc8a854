//! # Flag Export
//!
//! Fixed binary layout of one region's flags: 4 × 64 × 64 big-endian
//! `u32` words, plane-major, x-major, y-minor. No header; the region id
//! travels out of band (usually the file name).

use byteorder::{BigEndian, ByteOrder};
use clipmap_shared::{CELLS_PER_REGION, PLANES, REGION_SIZE};

use crate::error::PayloadError;
use crate::map::CollisionMap;
use crate::region::{FlagPlanes, RegionGrid};

/// Size of an encoded region in bytes.
pub const REGION_PAYLOAD_LEN: usize = CELLS_PER_REGION * 4;

/// Encodes a region's flags.
#[must_use]
pub fn encode_region_flags(grid: &RegionGrid) -> Vec<u8> {
    let mut out = vec![0u8; REGION_PAYLOAD_LEN];
    BigEndian::write_u32_into(grid.flag_words(), &mut out);
    out
}

/// Decodes a payload written by [`encode_region_flags`].
///
/// # Errors
///
/// Returns [`PayloadError::RegionLength`] unless the payload is exactly
/// [`REGION_PAYLOAD_LEN`] bytes.
pub fn decode_region_flags(bytes: &[u8]) -> Result<Box<FlagPlanes>, PayloadError> {
    if bytes.len() != REGION_PAYLOAD_LEN {
        return Err(PayloadError::RegionLength {
            expected: REGION_PAYLOAD_LEN,
            actual: bytes.len(),
        });
    }

    let mut planes: Box<FlagPlanes> = Box::new([[[0; REGION_SIZE]; REGION_SIZE]; PLANES]);
    let words: &mut [u32] = bytemuck::cast_slice_mut(&mut planes[..]);
    BigEndian::read_u32_into(bytes, words);
    Ok(planes)
}

/// Encodes every loaded region that is not entirely `BLOCKED`, in id order.
pub fn encode_map(map: &CollisionMap) -> impl Iterator<Item = (&RegionGrid, Vec<u8>)> + '_ {
    map.regions()
        .filter(|grid| !grid.is_empty())
        .map(|grid| (grid, encode_region_flags(grid)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmap_shared::{RegionFlag, RegionId};

    use crate::source::TerrainData;

    fn sample() -> RegionGrid {
        let mut grid = RegionGrid::new(RegionId::from_chunks(3, 4), None, Some(Vec::new()));
        grid.set_flags(0, 0, 1, 0x0102_0304);
        grid.set_flags(3, 63, 63, RegionFlag::Blocked.mask());
        grid
    }

    #[test]
    fn test_layout_is_big_endian_y_minor() {
        let bytes = encode_region_flags(&sample());
        assert_eq!(bytes.len(), 65_536);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[1, 2, 3, 4]);
        assert_eq!(&bytes[REGION_PAYLOAD_LEN - 4..], &[0x01, 0x28, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_restores_cells() {
        let grid = sample();
        let planes = decode_region_flags(&encode_region_flags(&grid)).unwrap();
        assert_eq!(&*planes, grid.flag_planes());
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            decode_region_flags(&[0; 12]).unwrap_err(),
            PayloadError::RegionLength {
                expected: REGION_PAYLOAD_LEN,
                actual: 12
            }
        );
        assert!(decode_region_flags(&vec![0; REGION_PAYLOAD_LEN + 4]).is_err());
    }

    #[test]
    fn test_encode_map_skips_empty_regions() {
        let empty = RegionGrid::new(RegionId::from_chunks(0, 0), Some(TerrainData::new()), None);
        let map = CollisionMap::from_regions(vec![empty, sample()]);
        let ids: Vec<RegionId> = encode_map(&map).map(|(grid, _)| grid.id()).collect();
        assert_eq!(ids, vec![RegionId::from_chunks(3, 4)]);
    }
}
