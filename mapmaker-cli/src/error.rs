//! CLI error type.

use mapmaker::composite::CompositeError;
use mapmaker::config::ConfigError;
use mapmaker::ingest::IngestError;
use mapmaker::logging::LoggingError;
use mapmaker::pyramid::PyramidError;
use mapmaker::store::StoreError;
use thiserror::Error;

/// Any failure that ends a CLI run with exit code 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad combination of command-line arguments.
    #[error("{0}")]
    InvalidArguments(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Tile store error: {0}")]
    Store(#[from] StoreError),

    #[error("Build failed: {0}")]
    Pyramid(#[from] PyramidError),

    #[error("Ingest failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Composite failed: {0}")]
    Composite(#[from] CompositeError),
}
