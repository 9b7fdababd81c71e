//! Persisted tile images.
//!
//! The [`TileStore`] trait is the only way the rest of the crate touches tile
//! pixels. Tiles are addressed by [`TileCoord`]; where and how they are kept
//! is up to the implementation.
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │  PyramidBuilder  │      │    Compositor    │
//! └────────┬─────────┘      └────────┬─────────┘
//!          │   &dyn TileStore        │
//!          └────────────┬────────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │    TileStore    │ (trait)
//!              └────────┬────────┘
//!                ┌──────┴───────┐
//!                ▼              ▼
//!        ┌───────────────┐ ┌─────────────────┐
//!        │ DiskTileStore │ │ MemoryTileStore │
//!        └───────────────┘ └─────────────────┘
//! ```
//!
//! # Write policy
//!
//! [`TileStore::write`] with `overwrite == false` leaves an existing tile
//! untouched and reports [`WriteOutcome::Kept`]. Interrupted builds can be
//! resumed by running them again; only missing tiles are produced.
//!
//! # Ownership
//!
//! A build run assumes it owns the store for its duration. Nothing detects
//! tiles added or removed by another process mid-run.

mod disk;
mod error;
mod memory;
mod path;

pub use disk::{save_jpeg, DiskTileStore};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryTileStore;
pub use path::{
    level_dir, parse_coordinate, parse_lod, parse_tile_path, tile_dir, tile_path, TilePathError,
    TILE_FILENAME,
};

use std::path::PathBuf;

use image::RgbImage;

use crate::coord::{TileCoord, TilePos};

/// Whether a write produced a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The tile was written.
    Written,
    /// A tile already existed and overwriting was not requested.
    Kept,
}

/// A store entry that could not be interpreted as a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Location of the offending entry.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of scanning one level of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelScan {
    /// Positions of every tile found.
    pub positions: Vec<TilePos>,
    /// Entries that were present but malformed.
    pub skipped: Vec<SkippedEntry>,
}

/// Storage for tile images addressed by level and grid position.
///
/// Implementations must be `Send + Sync` so a store can be shared behind a
/// reference by every component of a run.
pub trait TileStore: Send + Sync {
    /// Whether a tile exists at the coordinate.
    fn exists(&self, coord: TileCoord) -> bool;

    /// Load the tile at the coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no tile exists there, or an
    /// I/O or decoding error.
    fn read(&self, coord: TileCoord) -> StoreResult<RgbImage>;

    /// Store a tile.
    ///
    /// With `overwrite == false` an existing tile is left in place and
    /// [`WriteOutcome::Kept`] is returned. Coordinates outside
    /// [`MAX_COORDINATE`](crate::coord::MAX_COORDINATE) fail with
    /// [`StoreError::OutOfRange`].
    fn write(&self, coord: TileCoord, image: &RgbImage, overwrite: bool)
        -> StoreResult<WriteOutcome>;

    /// Find every tile stored at a level.
    ///
    /// Malformed entries, hidden ones and coordinates outside the supported
    /// range included, are reported in [`LevelScan::skipped`] rather than
    /// failing the scan. A level with no tiles yields an empty scan.
    fn scan_level(&self, lod: u32) -> StoreResult<LevelScan>;

    /// Levels that hold at least one entry, ascending.
    fn levels(&self) -> StoreResult<Vec<u32>>;
}
