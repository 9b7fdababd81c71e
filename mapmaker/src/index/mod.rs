//! In-memory index of which tiles exist at each level.
//!
//! The index is filled by scanning a [`TileStore`] and is then the source of
//! truth for a build run: the pyramid builder only reads tiles the index says
//! exist. LOD 0 is loaded once from the store; coarser levels are replaced
//! wholesale by the builder as it produces them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::coord::{BoundingBox, TileCoord, TilePos};
use crate::store::{SkippedEntry, StoreResult, TileStore};

/// Errors raised by index queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// No tiles are registered at the level.
    #[error("no tiles found at LOD {lod}")]
    EmptyLevel { lod: u32 },
}

/// Outcome of loading one level from a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Level that was loaded.
    pub lod: u32,
    /// Number of tiles registered.
    pub tiles: usize,
    /// Malformed entries that were left out.
    pub skipped: Vec<SkippedEntry>,
}

/// Set of known tile positions per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileIndex {
    levels: BTreeMap<u32, BTreeSet<TilePos>>,
}

impl TileIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a level of the store and register every tile found.
    ///
    /// Any previous entries for the level are replaced. Malformed store
    /// entries do not fail the load; they are counted in the report.
    pub fn load<S>(&mut self, store: &S, lod: u32) -> StoreResult<LoadReport>
    where
        S: TileStore + ?Sized,
    {
        let scan = store.scan_level(lod)?;
        let positions: BTreeSet<TilePos> = scan.positions.into_iter().collect();
        let tiles = positions.len();

        if !scan.skipped.is_empty() {
            warn!(
                lod,
                skipped = scan.skipped.len(),
                "Skipped malformed entries while loading level"
            );
        }
        info!(lod, tiles, "Loaded level from store");

        self.levels.insert(lod, positions);
        Ok(LoadReport {
            lod,
            tiles,
            skipped: scan.skipped,
        })
    }

    /// Positions registered at a level, or `None` if the level was never loaded.
    pub fn level(&self, lod: u32) -> Option<&BTreeSet<TilePos>> {
        self.levels.get(&lod)
    }

    /// Levels present in the index, ascending.
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }

    /// Number of tiles registered at a level.
    pub fn tile_count(&self, lod: u32) -> usize {
        self.levels.get(&lod).map_or(0, BTreeSet::len)
    }

    /// Whether a level has at least one tile.
    pub fn has_tiles(&self, lod: u32) -> bool {
        self.tile_count(lod) > 0
    }

    /// Whether a tile is registered.
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.levels
            .get(&coord.lod)
            .is_some_and(|set| set.contains(&coord.pos()))
    }

    /// Register a single tile. Returns `false` if it was already present.
    pub fn insert(&mut self, coord: TileCoord) -> bool {
        self.levels.entry(coord.lod).or_default().insert(coord.pos())
    }

    /// Replace every entry of a level.
    pub fn replace_level(&mut self, lod: u32, positions: BTreeSet<TilePos>) {
        self.levels.insert(lod, positions);
    }

    /// Smallest box containing every tile of a level.
    ///
    /// # Errors
    ///
    /// [`IndexError::EmptyLevel`] if the level has no tiles.
    pub fn bounding_box(&self, lod: u32) -> Result<BoundingBox, IndexError> {
        self.levels
            .get(&lod)
            .and_then(|set| BoundingBox::from_positions(set.iter().copied()))
            .ok_or(IndexError::EmptyLevel { lod })
    }

    /// Tiles of a level inside an inclusive rectangle, ordered by x then z.
    pub fn tiles_in_rect(&self, lod: u32, rect: BoundingBox) -> Vec<TileCoord> {
        let Some(set) = self.levels.get(&lod) else {
            return Vec::new();
        };
        if rect.min_x > rect.max_x || rect.min_z > rect.max_z {
            return Vec::new();
        }

        let start = TilePos::new(rect.min_x, rect.min_z);
        let end = TilePos::new(rect.max_x, rect.max_z);
        set.range(start..=end)
            .filter(|pos| rect.contains(**pos))
            .map(|pos| pos.at(lod))
            .collect()
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileIndex {{")?;
        for (i, (lod, set)) in self.levels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", lod, set.len())?;
        }
        write!(f, "}}")
    }
}
