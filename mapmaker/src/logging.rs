//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`]
//! once at startup to decide where they go: stderr always, plus an optional
//! plain-text log file written from a background thread.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::macros::format_description;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Where and how much to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log at `debug` instead of `info` when `RUST_LOG` is unset.
    pub verbose: bool,
    /// Also write the log to this file (created or appended).
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log file path: {0}")]
    InvalidLogFile(PathBuf),

    #[error("failed to open log file {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Keeps the background log writer alive.
///
/// Dropping it flushes and stops the file writer; hold it until exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level chosen by [`LoggingConfig::verbose`].
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));
    let timer = LocalTime::new(format_description!("[hour]:[minute]:[second]"));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_target(false);

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(timer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(LoggingGuard { _file: guard })
}

/// Open a non-rotating, non-blocking writer for `path`.
fn open_log_file(path: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|source| LoggingError::OpenLogFile {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(tracing_appender::non_blocking(appender))
}
