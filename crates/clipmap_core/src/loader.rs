//! # Region Loader
//!
//! Phase one of a build: decode every region id into a [`RegionGrid`].
//!
//! ## Threading
//!
//! Regions are independent, so ids are fanned out to a pool of scoped
//! workers over a bounded channel. Each worker seeds its grid privately and
//! sends it back; only the calling thread inserts into the region table.
//!
//! ```text
//! producer ──ids──▶ [bounded] ──▶ worker × N ──grids──▶ caller ──▶ BTreeMap
//! ```
//!
//! A fatal decode error lowers a shared stop mark to its region id. The
//! producer stops queueing and workers skip every id above the mark, so
//! all lower ids still load and the error with the lowest id wins.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use clipmap_shared::RegionId;
use crossbeam_channel::{bounded, unbounded};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{BuildConfig, REGION_ID_SPACE};
use crate::error::{BuildError, BuildResult, DecodeFailure, SourceError};
use crate::region::RegionGrid;
use crate::source::RegionSource;

/// Size of an encrypted location payload that cannot be a missing key.
pub const CORRUPT_PAYLOAD_LEN: usize = 32;

/// Jobs queued per worker.
const QUEUE_DEPTH: usize = 64;

/// What happened to one region id.
#[derive(Debug)]
pub enum LoadOutcome {
    /// At least one data source was present.
    Loaded {
        /// The seeded grid.
        grid: RegionGrid,
        /// Location data existed but did not decode and was dropped.
        locations_absent: bool,
    },
    /// The region has no data at all.
    Invalid,
    /// The provider failed to read the region.
    Unreadable(SourceError),
}

/// Load phase counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Region ids attempted.
    pub attempted: usize,
    /// Regions inserted into the map.
    pub loaded: usize,
    /// Regions with no data.
    pub invalid: usize,
    /// Regions the provider could not read.
    pub unreadable: usize,
    /// Loaded regions whose location payload was treated as absent.
    pub locations_absent: usize,
}

impl LoadStats {
    fn record(&mut self, outcome: &LoadOutcome) {
        self.attempted += 1;
        match outcome {
            LoadOutcome::Loaded { locations_absent, .. } => {
                self.loaded += 1;
                if *locations_absent {
                    self.locations_absent += 1;
                }
            }
            LoadOutcome::Invalid => self.invalid += 1,
            LoadOutcome::Unreadable(_) => self.unreadable += 1,
        }
    }
}

/// Loads a single region.
///
/// # Errors
///
/// Returns [`BuildError::CorruptLocations`] if a location payload of exactly
/// [`CORRUPT_PAYLOAD_LEN`] bytes decrypted but did not parse. Any other
/// location decode failure is logged and the region loads without
/// placements.
pub fn load_region<S>(source: &S, id: RegionId) -> BuildResult<LoadOutcome>
where
    S: RegionSource + ?Sized,
{
    let terrain = match source.terrain(id) {
        Ok(terrain) => terrain,
        Err(err) => {
            warn!("Skipping region {}: {}", id, err);
            return Ok(LoadOutcome::Unreadable(err));
        }
    };

    let mut locations_absent = false;
    let placements = match source.placements(id) {
        Ok(placements) => placements,
        Err(SourceError::LocationDecode {
            payload_len,
            failure: DecodeFailure::Malformed(reason),
            ..
        }) if payload_len == CORRUPT_PAYLOAD_LEN => {
            return Err(BuildError::CorruptLocations {
                region: id,
                reason: DecodeFailure::Malformed(reason),
            });
        }
        Err(err @ SourceError::LocationDecode { .. }) => {
            warn!("Region {}: {}; treating locations as absent", id, err);
            locations_absent = true;
            Some(Vec::new())
        }
        Err(err @ SourceError::Unreadable { .. }) => {
            warn!("Skipping region {}: {}", id, err);
            return Ok(LoadOutcome::Unreadable(err));
        }
    };

    let grid = RegionGrid::new(id, terrain, placements);
    if !grid.is_valid() {
        return Ok(LoadOutcome::Invalid);
    }

    debug!(
        "Loaded region {} (terrain: {}, placements: {})",
        id,
        grid.has_terrain(),
        grid.placements().len()
    );
    Ok(LoadOutcome::Loaded {
        grid,
        locations_absent,
    })
}

/// Loads region ids `0..config.max_region` on `config.load_workers` threads.
///
/// Invalid and unreadable regions are counted and left out of the table.
///
/// # Errors
///
/// Returns the fatal error of the lowest failing region id, or
/// [`BuildError::WorkerPanicked`] if a worker thread panicked.
pub fn load_regions<S>(
    source: &S,
    config: &BuildConfig,
) -> BuildResult<(BTreeMap<RegionId, RegionGrid>, LoadStats)>
where
    S: RegionSource + ?Sized,
{
    let max_region = config.max_region.min(REGION_ID_SPACE);
    let workers = config.load_workers.max(1);

    let stop_mark = AtomicU32::new(u32::MAX);
    let fatal_slot: Mutex<Option<(RegionId, BuildError)>> = Mutex::new(None);
    let stop = &stop_mark;
    let fatal = &fatal_slot;

    let (job_tx, job_rx) = bounded::<RegionId>(workers * QUEUE_DEPTH);
    let (result_tx, result_rx) = unbounded::<(RegionId, LoadOutcome)>();

    let mut regions = BTreeMap::new();
    let mut stats = LoadStats::default();

    let panicked = thread::scope(|scope| {
        let producer = scope.spawn(move || {
            for raw in 0..max_region {
                if stop.load(Ordering::Acquire) != u32::MAX {
                    break;
                }
                if job_tx.send(RegionId::new(raw as u16)).is_err() {
                    break;
                }
            }
        });

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for id in &job_rx {
                        if u32::from(id.raw()) > stop.load(Ordering::Acquire) {
                            continue;
                        }
                        match load_region(source, id) {
                            Ok(outcome) => {
                                if result_tx.send((id, outcome)).is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                stop.fetch_min(u32::from(id.raw()), Ordering::AcqRel);
                                let mut slot = fatal.lock();
                                if slot.as_ref().map_or(true, |(first, _)| id < *first) {
                                    *slot = Some((id, err));
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        // Only the workers may hold these, or the loops below never end.
        drop(job_rx);
        drop(result_tx);

        for (id, outcome) in &result_rx {
            stats.record(&outcome);
            if let LoadOutcome::Loaded { grid, .. } = outcome {
                regions.insert(id, grid);
            }
        }

        let mut panicked = producer.join().is_err();
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        panicked
    });

    if let Some((id, err)) = fatal_slot.into_inner() {
        error!("Build aborted at region {}: {}", id, err);
        return Err(err);
    }
    if panicked {
        error!("A region load worker panicked");
        return Err(BuildError::WorkerPanicked);
    }

    info!(
        "Loaded {} of {} regions ({} invalid, {} unreadable, {} without locations)",
        stats.loaded, stats.attempted, stats.invalid, stats.unreadable, stats.locations_absent
    );
    Ok((regions, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, Placement, TerrainData};
    use clipmap_shared::Position;

    fn id(raw: u16) -> RegionId {
        RegionId::new(raw)
    }

    fn small(workers: usize) -> BuildConfig {
        BuildConfig::default().with_workers(workers).with_max_region(512)
    }

    fn decode_error(raw: u16, payload_len: usize, failure: DecodeFailure) -> SourceError {
        SourceError::LocationDecode {
            region: id(raw),
            payload_len,
            failure,
        }
    }

    #[test]
    fn test_load_region_outcomes() {
        let mut source = MemorySource::new();
        source.insert_terrain(id(1), TerrainData::with_ground(1));
        source.insert_placements(id(2), Vec::new());

        assert!(matches!(load_region(&source, id(0)).unwrap(), LoadOutcome::Invalid));
        assert!(matches!(
            load_region(&source, id(1)).unwrap(),
            LoadOutcome::Loaded { locations_absent: false, .. }
        ));
        assert!(matches!(
            load_region(&source, id(2)).unwrap(),
            LoadOutcome::Loaded { locations_absent: false, .. }
        ));
    }

    #[test]
    fn test_corrupt_32_byte_payload_is_fatal() {
        let mut source = MemorySource::new();
        source.fail_placements(id(3), decode_error(3, 32, DecodeFailure::Malformed("eof".into())));

        let err = load_region(&source, id(3)).unwrap_err();
        assert!(matches!(err, BuildError::CorruptLocations { region, .. } if region == id(3)));
    }

    #[test]
    fn test_other_decode_failures_are_absent() {
        let mut source = MemorySource::new();
        source.insert_terrain(id(4), TerrainData::with_ground(1));
        source.fail_placements(id(4), decode_error(4, 32, DecodeFailure::InvalidKey));
        source.fail_placements(id(5), decode_error(5, 120, DecodeFailure::Malformed("eof".into())));

        for raw in [4, 5] {
            match load_region(&source, id(raw)).unwrap() {
                LoadOutcome::Loaded {
                    grid,
                    locations_absent,
                } => {
                    assert!(locations_absent);
                    assert!(grid.is_valid());
                    assert!(grid.placements().is_empty());
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn test_unreadable_is_skipped() {
        let mut source = MemorySource::new();
        let err = SourceError::Unreadable {
            region: id(7),
            reason: "io".into(),
        };
        source.fail_terrain(id(7), err.clone());
        assert!(matches!(
            load_region(&source, id(7)).unwrap(),
            LoadOutcome::Unreadable(e) if e == err
        ));
    }

    #[test]
    fn test_load_regions_counts() {
        let mut source = MemorySource::new();
        for raw in [0u16, 10, 300] {
            source.insert_terrain(id(raw), TerrainData::with_ground(1));
        }
        source.add_placement(Placement::new(1, 10, 0, Position::new(5, 5, 0)));
        source.fail_terrain(
            id(20),
            SourceError::Unreadable {
                region: id(20),
                reason: "io".into(),
            },
        );
        source.fail_placements(id(30), decode_error(30, 64, DecodeFailure::InvalidKey));

        let (regions, stats) = load_regions(&source, &small(3)).unwrap();
        assert_eq!(stats.attempted, 512);
        assert_eq!(stats.loaded, 4);
        assert_eq!(stats.unreadable, 1);
        assert_eq!(stats.locations_absent, 1);
        assert_eq!(stats.invalid, 512 - 5);
        assert_eq!(
            regions.keys().map(|id| id.raw()).collect::<Vec<_>>(),
            vec![0, 10, 30, 300]
        );
        assert_eq!(regions[&id(0)].placements().len(), 1);
    }

    #[test]
    fn test_fatal_error_reports_lowest_region() {
        let mut source = MemorySource::new();
        for raw in [40u16, 41, 200] {
            source.fail_placements(
                id(raw),
                decode_error(raw, 32, DecodeFailure::Malformed("bad".into())),
            );
        }

        for workers in [1, 4] {
            let err = load_regions(&source, &small(workers)).unwrap_err();
            assert!(
                matches!(err, BuildError::CorruptLocations { region, .. } if region == id(40)),
                "{err:?}"
            );
        }
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let mut source = MemorySource::new();
        for raw in (0u16..512).step_by(7) {
            source.insert_terrain(id(raw), TerrainData::with_ground(raw));
        }

        let (single, single_stats) = load_regions(&source, &small(1)).unwrap();
        let (many, many_stats) = load_regions(&source, &small(8)).unwrap();
        assert_eq!(single_stats, many_stats);
        assert!(single.keys().eq(many.keys()));
    }
}
