//! Level-by-level pyramid construction.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info};

use super::error::{PyramidError, PyramidResult};
use super::merge::{blank_tile, merge_group};
use crate::config::PyramidConfig;
use crate::coord::{parent_coordinate, BoundingBox, TileCoord, TilePos};
use crate::index::TileIndex;
use crate::store::{TileStore, WriteOutcome};

/// Callback invoked after every slot of a level has been handled.
pub type ProgressCallback = Box<dyn Fn(&SlotProgress) + Send + Sync>;

/// How a slot of a coarse level was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Built from this many fine tiles (1 to 4).
    Merged { sources: usize },
    /// No fine tiles: a solid background tile.
    Empty,
}

/// Progress of a level build, reported per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotProgress {
    /// Level being built.
    pub lod: u32,
    /// Slots handled so far, including this one.
    pub completed: usize,
    /// Slots in the level.
    pub total: usize,
    /// Tile produced for this slot.
    pub tile: TileCoord,
    /// How the slot was filled.
    pub kind: SlotKind,
    /// Whether the tile was written or an existing one kept.
    pub outcome: WriteOutcome,
}

/// Summary of one level build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    /// Level that was built.
    pub lod: u32,
    /// Source-level bounding box after rounding out to even corners.
    pub bounds: BoundingBox,
    /// Number of coarse slots enumerated.
    pub slots: usize,
    /// Slots filled from at least one source tile.
    pub merged: usize,
    /// Slots filled with background.
    pub empty: usize,
    /// Tiles written to the store.
    pub written: usize,
    /// Tiles already present and left untouched.
    pub kept: usize,
}

impl fmt::Display for LevelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LOD {}: {} tiles ({} merged, {} empty), {} written, {} kept",
            self.lod, self.slots, self.merged, self.empty, self.written, self.kept
        )
    }
}

/// Builds coarser levels from the level below, one level at a time.
///
/// LOD 0 is the source level and is only ever read. LOD `n` is built from
/// LOD `n - 1` by merging every 2×2 group of its rounded-out bounding box,
/// so levels must be built in ascending order.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use mapmaker::config::PyramidConfig;
/// use mapmaker::coord::TileCoord;
/// use mapmaker::index::TileIndex;
/// use mapmaker::pyramid::PyramidBuilder;
/// use mapmaker::store::{MemoryTileStore, TileStore};
///
/// let store = MemoryTileStore::new();
/// let tile = RgbImage::from_pixel(8, 8, Rgb([200, 180, 120]));
/// store.write(TileCoord::new(0, 0, 0), &tile, false).unwrap();
///
/// let mut index = TileIndex::new();
/// index.load(&store, 0).unwrap();
///
/// let config = PyramidConfig::new().with_max_lod(2);
/// let mut builder = PyramidBuilder::new(&store, index, config).unwrap();
/// let reports = builder.build_all().unwrap();
///
/// assert_eq!(reports.len(), 2);
/// assert!(store.exists(TileCoord::new(2, 0, 0)));
/// ```
pub struct PyramidBuilder<'a, S: TileStore + ?Sized> {
    store: &'a S,
    index: TileIndex,
    config: PyramidConfig,
    tile_size: u32,
    progress: Option<ProgressCallback>,
}

impl<'a, S: TileStore + ?Sized> PyramidBuilder<'a, S> {
    /// Create a builder over `store`, using `index` as the record of which
    /// tiles exist.
    ///
    /// The tile size is taken from the first LOD-0 tile in the index.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::Config`] if the configuration is out of range
    /// - [`PyramidError::EmptyLevel`] if the index has no LOD-0 tiles
    /// - [`PyramidError::NonSquareTile`] if the LOD-0 tile is not square
    pub fn new(store: &'a S, index: TileIndex, config: PyramidConfig) -> PyramidResult<Self> {
        config.validate()?;

        let first = index
            .level(0)
            .and_then(|set| set.iter().next())
            .map(|pos| pos.at(0))
            .ok_or(PyramidError::EmptyLevel { lod: 0 })?;

        let (width, height) = store.read(first)?.dimensions();
        if width != height || width == 0 {
            return Err(PyramidError::NonSquareTile {
                coord: first,
                width,
                height,
            });
        }
        info!(tile_size = width, source = %first, "Discovered tile size");

        Ok(Self {
            store,
            index,
            config,
            tile_size: width,
            progress: None,
        })
    }

    /// Report progress through `callback` after every slot.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Edge length of every tile, in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Configuration in use.
    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    /// Current index, including every level built so far.
    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    /// Consume the builder and return its index.
    pub fn into_index(self) -> TileIndex {
        self.index
    }

    /// Build every level from 1 to the configured maximum.
    ///
    /// Stops at the first failing level; coarser levels are not attempted.
    pub fn build_all(&mut self) -> PyramidResult<Vec<LevelReport>> {
        (1..=self.config.max_lod)
            .map(|lod| self.build_level(lod))
            .collect()
    }

    /// Build level `lod` from level `lod - 1`.
    ///
    /// Every slot of the rounded-out source bounding box yields exactly one
    /// tile: merged from its source tiles, or solid background when it has
    /// none. Tiles already in the store are kept unless overwriting is
    /// configured. On success the index entry for `lod` is replaced by the
    /// produced tiles; on failure it is left as it was.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::SourceLevelNotBuildable`] for `lod == 0`
    /// - [`PyramidError::MissingSourceLevel`] if `lod - 1` has no tiles
    /// - [`PyramidError::CoordinateOutOfRange`] if `lod - 1` holds a tile
    ///   beyond [`MAX_COORDINATE`](crate::coord::MAX_COORDINATE)
    /// - [`PyramidError::Store`] / [`PyramidError::TileSizeMismatch`] from merging
    pub fn build_level(&mut self, lod: u32) -> PyramidResult<LevelReport> {
        let below = lod
            .checked_sub(1)
            .ok_or(PyramidError::SourceLevelNotBuildable)?;
        if !self.index.has_tiles(below) {
            return Err(PyramidError::MissingSourceLevel { lod, below });
        }

        let source = self.index.bounding_box(below)?;
        if !source.is_valid() {
            return Err(PyramidError::CoordinateOutOfRange {
                lod: below,
                bounds: source,
            });
        }
        let bounds = source.expand_to_even();
        let total = bounds.coarse_cell_count();
        info!(lod, bounds = %bounds, slots = total, "Building level");

        let blank = blank_tile(self.tile_size, self.config.background_color);
        let mut produced = BTreeSet::new();
        let mut report = LevelReport {
            lod,
            bounds,
            slots: 0,
            merged: 0,
            empty: 0,
            written: 0,
            kept: 0,
        };

        for cell in bounds.coarse_cells() {
            let origin = cell.at(below);
            let group = BoundingBox::new(cell.x, cell.z, cell.x + 1, cell.z + 1);
            let members = self.index.tiles_in_rect(below, group);
            let (x, z) = parent_coordinate(cell.x, cell.z);
            let target = TileCoord::new(lod, x, z);

            let kind = if members.is_empty() {
                SlotKind::Empty
            } else {
                SlotKind::Merged {
                    sources: members.len(),
                }
            };

            let outcome = if !self.config.overwrite_existing && self.store.exists(target) {
                WriteOutcome::Kept
            } else {
                match kind {
                    SlotKind::Empty => {
                        debug!(tile = %target, "Creating empty tile");
                        self.store
                            .write(target, &blank, self.config.overwrite_existing)?
                    }
                    SlotKind::Merged { sources } => {
                        debug!(tile = %target, sources, "Joining tiles");
                        let merged = merge_group(
                            self.store,
                            origin,
                            &members,
                            self.tile_size,
                            self.config.background_color,
                        )?;
                        self.store
                            .write(target, &merged, self.config.overwrite_existing)?
                    }
                }
            };

            produced.insert(TilePos::new(x, z));
            report.slots += 1;
            match kind {
                SlotKind::Empty => report.empty += 1,
                SlotKind::Merged { .. } => report.merged += 1,
            }
            match outcome {
                WriteOutcome::Written => report.written += 1,
                WriteOutcome::Kept => report.kept += 1,
            }

            if let Some(progress) = &self.progress {
                progress(&SlotProgress {
                    lod,
                    completed: report.slots,
                    total,
                    tile: target,
                    kind,
                    outcome,
                });
            }
        }

        self.index.replace_level(lod, produced);
        info!(
            lod,
            slots = report.slots,
            merged = report.merged,
            empty = report.empty,
            written = report.written,
            kept = report.kept,
            "Finished level"
        );
        debug!(index = %self.index, "Index updated");
        Ok(report)
    }
}
