//! Error types for pyramid construction.

use thiserror::Error;

use crate::config::ConfigError;
use crate::coord::{BoundingBox, TileCoord};
use crate::index::IndexError;
use crate::store::StoreError;

/// Result type for pyramid operations.
pub type PyramidResult<T> = Result<T, PyramidError>;

/// Errors that abort a pyramid build.
///
/// None of these are retried. A level built on incomplete input would
/// poison every coarser level, so the whole run stops instead.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// A level that must hold tiles has none.
    #[error("no tiles found at LOD {lod}")]
    EmptyLevel { lod: u32 },

    /// A level was requested before the level below it was available.
    #[error("cannot build LOD {lod}: LOD {below} is missing or empty")]
    MissingSourceLevel { lod: u32, below: u32 },

    /// LOD 0 only ever comes from the source screenshots.
    #[error("LOD 0 is the source level and cannot be built")]
    SourceLevelNotBuildable,

    /// A level holds tiles beyond the supported coordinate range.
    #[error("LOD {lod} spans {bounds}, outside the supported coordinate range")]
    CoordinateOutOfRange { lod: u32, bounds: BoundingBox },

    /// LOD-0 tiles must be square.
    #[error("tile {coord} is {width}x{height}, tiles must be square")]
    NonSquareTile {
        coord: TileCoord,
        width: u32,
        height: u32,
    },

    /// A source tile differs in size from the rest of the store.
    #[error("tile {coord} is {width}x{height}, expected {expected}x{expected}")]
    TileSizeMismatch {
        coord: TileCoord,
        expected: u32,
        width: u32,
        height: u32,
    },

    /// The configuration is out of range.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing a tile failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IndexError> for PyramidError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::EmptyLevel { lod } => PyramidError::EmptyLevel { lod },
        }
    }
}
