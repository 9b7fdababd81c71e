//! Error types for tile store operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::TileCoord;

/// Result type for tile store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing tiles.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No tile is stored at the coordinate.
    #[error("tile {0} not found")]
    NotFound(TileCoord),

    /// The coordinate is outside the range tiles can be stored at.
    #[error("tile {0} is outside the supported coordinate range")]
    OutOfRange(TileCoord),

    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Decoding or encoding an image failed.
    #[error("image error at {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
