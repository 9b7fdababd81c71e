//! Screenshot filename parsing.
//!
//! Screenshots are named after the world position the camera was at:
//!
//! - `<prefix>_<x>_<z>.png`: raw screenshot
//! - `<prefix>_<x>_<z>_tile.png`: screenshot already cropped to a tile
//!
//! Examples: `everon_1600_3200.png`, `everon_-800_3200_tile.png`.
//!
//! `x` and `z` are signed world-space units, not grid indices.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Which variant of a screenshot a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotKind {
    /// Full camera frame.
    Raw,
    /// Frame already cropped around its center.
    Cropped,
}

impl fmt::Display for ScreenshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenshotKind::Raw => write!(f, "raw"),
            ScreenshotKind::Cropped => write!(f, "cropped"),
        }
    }
}

/// Parsed screenshot filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotName {
    /// Everything before the coordinates, usually the world name.
    pub prefix: String,
    /// World x position.
    pub x: i32,
    /// World z position.
    pub z: i32,
    pub kind: ScreenshotKind,
}

/// Error parsing a screenshot filename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    /// Filename doesn't match `<prefix>_<x>_<z>[_tile].png`.
    #[error("filename doesn't match <prefix>_<x>_<z>[_tile].png: {0}")]
    InvalidPattern(String),

    /// A coordinate does not fit in an `i32`.
    #[error("invalid {axis} coordinate: {value}")]
    InvalidCoordinate { axis: char, value: String },
}

fn screenshot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Greedy prefix, so the coordinates are always the last two numbers.
    PATTERN.get_or_init(|| Regex::new(r"^(.+)_(-?\d+)_(-?\d+)(_tile)?\.png$").unwrap())
}

/// Parse a screenshot filename (no directory part).
///
/// # Examples
///
/// ```
/// use mapmaker::ingest::{parse_screenshot_filename, ScreenshotKind};
///
/// let name = parse_screenshot_filename("everon_-800_3200_tile.png").unwrap();
/// assert_eq!((name.x, name.z), (-800, 3200));
/// assert_eq!(name.kind, ScreenshotKind::Cropped);
///
/// assert!(parse_screenshot_filename("notes.txt").is_err());
/// ```
pub fn parse_screenshot_filename(filename: &str) -> Result<ScreenshotName, FilenameError> {
    let captures = screenshot_pattern()
        .captures(filename)
        .ok_or_else(|| FilenameError::InvalidPattern(filename.to_string()))?;

    let coordinate = |index: usize, axis: char| {
        let value = captures.get(index).map_or("", |m| m.as_str());
        value
            .parse::<i32>()
            .map_err(|_| FilenameError::InvalidCoordinate {
                axis,
                value: value.to_string(),
            })
    };

    let x = coordinate(2, 'x')?;
    let z = coordinate(3, 'z')?;
    let prefix = captures.get(1).map_or("", |m| m.as_str()).to_string();
    let kind = if captures.get(4).is_some() {
        ScreenshotKind::Cropped
    } else {
        ScreenshotKind::Raw
    };

    Ok(ScreenshotName { prefix, x, z, kind })
}
