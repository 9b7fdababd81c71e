//! Error types for screenshot ingestion.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that stop an ingest run.
///
/// Malformed filenames are not among them: those files are skipped and
/// reported in the [`ScanReport`](super::ScanReport).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input directory can't be turned into a glob pattern.
    #[error("input path is not valid UTF-8: {0}")]
    InvalidInputPath(PathBuf),

    #[error("invalid screenshot pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Nothing to ingest.
    #[error("no screenshots to ingest")]
    NoScreenshots,

    /// Spacing can't be inferred; configure it explicitly.
    #[error("cannot infer screenshot spacing from {screenshots} screenshot(s), set the step explicitly")]
    UndeterminedStep { screenshots: usize },

    /// The crop is larger than the image.
    #[error("{path} is {width}x{height}, smaller than the {size}px crop")]
    ImageTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        size: u32,
    },

    /// Two screenshots land on the same grid cell.
    #[error("{path} maps to grid cell {x},{z} which is already taken by {existing}")]
    GridCollision {
        path: PathBuf,
        existing: PathBuf,
        x: i32,
        z: i32,
    },

    /// A screenshot maps to a grid cell beyond the supported coordinate range.
    #[error("{path} maps to grid cell {x},{z}, outside the supported coordinate range")]
    OutOfRange { path: PathBuf, x: i32, z: i32 },

    /// Decoding a screenshot failed.
    #[error("failed to read screenshot {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
