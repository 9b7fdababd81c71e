//! Tile addressing.
//!
//! Pure integer math relating a tile to its parent at the next coarser level
//! and to its four children at the next finer level. World coordinates can be
//! negative, so every halving uses floor division (`div_euclid`), never
//! Rust's truncating `/`. With truncation `-1 / 2 == 0` and tiles on either
//! side of the origin would collapse into the same parent.
//!
//! Coordinates are limited to `-MAX_COORDINATE..=MAX_COORDINATE` on both
//! axes. Inside that range doubling, rounding a box out to even values and
//! box widths all fit in an `i32`.

mod types;

pub use types::{BoundingBox, TileCoord, TilePos};

/// Largest magnitude of an `x` or `z` tile coordinate.
pub const MAX_COORDINATE: i32 = (1 << 30) - 1;

/// Whether `value` is a usable `x` or `z` coordinate.
#[inline]
pub fn is_valid_coordinate(value: i32) -> bool {
    (-MAX_COORDINATE..=MAX_COORDINATE).contains(&value)
}

/// The four finer-level coordinates that compose the coarser tile at `(x, z)`.
///
/// Order: `(2x, 2z)`, `(2x+1, 2z)`, `(2x, 2z+1)`, `(2x+1, 2z+1)`.
/// Only defined for coordinates of magnitude up to `MAX_COORDINATE / 2`;
/// [`TileCoord::children`] checks this.
#[inline]
pub fn child_coordinates(x: i32, z: i32) -> [(i32, i32); 4] {
    let (cx, cz) = (2 * x, 2 * z);
    [(cx, cz), (cx + 1, cz), (cx, cz + 1), (cx + 1, cz + 1)]
}

/// The coarser-level coordinate containing the tile at `(x, z)`.
#[inline]
pub fn parent_coordinate(x: i32, z: i32) -> (i32, i32) {
    (x.div_euclid(2), z.div_euclid(2))
}
