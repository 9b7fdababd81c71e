//! On-disk tile layout.
//!
//! Map viewers fetch tiles from `<root>/<lod>/<x>/<z>/tile.jpg`, where `lod`
//! is an unsigned decimal and `x`/`z` are signed decimals without leading
//! zeros. This module is the only place those paths are built or parsed.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::coord::{is_valid_coordinate, TileCoord};

/// Fixed file name of every tile.
pub const TILE_FILENAME: &str = "tile.jpg";

/// Errors parsing a path component of the tile layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilePathError {
    /// Level directory name is not an unsigned decimal.
    #[error("invalid level directory '{0}'")]
    InvalidLod(String),

    /// Coordinate directory name is not a signed decimal.
    #[error("invalid {axis} coordinate directory '{name}'")]
    InvalidCoordinate { axis: char, name: String },

    /// Coordinate is a decimal outside `-MAX_COORDINATE..=MAX_COORDINATE`.
    #[error("{axis} coordinate directory '{name}' is outside the supported range")]
    CoordinateOutOfRange { axis: char, name: String },

    /// Path does not have the `<lod>/<x>/<z>/tile.jpg` shape.
    #[error("path '{0}' does not match <lod>/<x>/<z>/tile.jpg")]
    InvalidLayout(String),
}

fn lod_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").unwrap())
}

fn coordinate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Canonical form only: no '+', no leading zeros, no "-0".
    PATTERN.get_or_init(|| Regex::new(r"^(0|-?[1-9][0-9]*)$").unwrap())
}

/// Directory holding every tile of one level.
pub fn level_dir(root: &Path, lod: u32) -> PathBuf {
    root.join(lod.to_string())
}

/// Directory holding a single tile file.
pub fn tile_dir(root: &Path, coord: TileCoord) -> PathBuf {
    level_dir(root, coord.lod)
        .join(coord.x.to_string())
        .join(coord.z.to_string())
}

/// Full path of a tile file.
pub fn tile_path(root: &Path, coord: TileCoord) -> PathBuf {
    tile_dir(root, coord).join(TILE_FILENAME)
}

/// Parse a level directory name.
pub fn parse_lod(name: &str) -> Result<u32, TilePathError> {
    if !lod_pattern().is_match(name) {
        return Err(TilePathError::InvalidLod(name.to_string()));
    }
    name.parse()
        .map_err(|_| TilePathError::InvalidLod(name.to_string()))
}

/// Parse an `x` or `z` coordinate directory name.
///
/// Decimals beyond [`MAX_COORDINATE`](crate::coord::MAX_COORDINATE) in
/// magnitude are rejected even when they fit in an `i32`.
pub fn parse_coordinate(axis: char, name: &str) -> Result<i32, TilePathError> {
    if !coordinate_pattern().is_match(name) {
        return Err(TilePathError::InvalidCoordinate {
            axis,
            name: name.to_string(),
        });
    }
    match name.parse::<i32>() {
        Ok(value) if is_valid_coordinate(value) => Ok(value),
        _ => Err(TilePathError::CoordinateOutOfRange {
            axis,
            name: name.to_string(),
        }),
    }
}

/// Parse a tile path relative to the store root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mapmaker::coord::TileCoord;
/// use mapmaker::store::parse_tile_path;
///
/// let coord = parse_tile_path(Path::new("3/-4/12/tile.jpg")).unwrap();
/// assert_eq!(coord, TileCoord::new(3, -4, 12));
/// ```
pub fn parse_tile_path(relative: &Path) -> Result<TileCoord, TilePathError> {
    let layout_error = || TilePathError::InvalidLayout(relative.display().to_string());

    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()
        .ok_or_else(layout_error)?;

    match parts.as_slice() {
        [lod, x, z, file] if *file == TILE_FILENAME => Ok(TileCoord::new(
            parse_lod(lod)?,
            parse_coordinate('x', x)?,
            parse_coordinate('z', z)?,
        )),
        _ => Err(layout_error()),
    }
}
