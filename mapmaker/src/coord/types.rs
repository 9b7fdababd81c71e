//! Coordinate value types for the tile pyramid.

use std::fmt;

/// Grid position of a tile within one level of detail.
///
/// `x` grows east and `z` grows north in world space. Ordering is by `x`
/// then `z`, which is also the order the pyramid builder walks a level in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    pub x: i32,
    pub z: i32,
}

impl TilePos {
    /// Create a new grid position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Whether both axes are within the coordinate range.
    pub fn is_valid(&self) -> bool {
        super::is_valid_coordinate(self.x) && super::is_valid_coordinate(self.z)
    }

    /// Attach a level of detail, producing a full tile coordinate.
    pub const fn at(self, lod: u32) -> TileCoord {
        TileCoord {
            lod,
            x: self.x,
            z: self.z,
        }
    }
}

impl From<(i32, i32)> for TilePos {
    fn from((x, z): (i32, i32)) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Full address of a tile: level of detail plus grid position.
///
/// This is a lightweight value handle. The pixels live in a
/// [`TileStore`](crate::store::TileStore) and are loaded on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub lod: u32,
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub const fn new(lod: u32, x: i32, z: i32) -> Self {
        Self { lod, x, z }
    }

    /// Grid position without the level.
    pub const fn pos(&self) -> TilePos {
        TilePos {
            x: self.x,
            z: self.z,
        }
    }

    /// Whether both axes are within the coordinate range.
    pub fn is_valid(&self) -> bool {
        self.pos().is_valid()
    }

    /// The coarser tile at `lod + 1` that this tile is merged into.
    pub fn parent(&self) -> TileCoord {
        let (x, z) = super::parent_coordinate(self.x, self.z);
        TileCoord::new(self.lod + 1, x, z)
    }

    /// The four finer tiles at `lod - 1` that compose this tile.
    ///
    /// Returns `None` at LOD 0, which has no finer level, and when the
    /// children would fall outside the coordinate range.
    pub fn children(&self) -> Option<[TileCoord; 4]> {
        let lod = self.lod.checked_sub(1)?;
        let limit = super::MAX_COORDINATE / 2;
        if self.x.abs() > limit || self.z.abs() > limit {
            return None;
        }
        Some(super::child_coordinates(self.x, self.z).map(|(x, z)| TileCoord::new(lod, x, z)))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} @ LOD {}", self.x, self.z, self.lod)
    }
}

/// Inclusive world-space bounding box of the tiles in one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl BoundingBox {
    /// Create a bounding box from inclusive corners.
    pub const fn new(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Smallest box containing every position, or `None` for an empty set.
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = TilePos>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.x, first.z, first.x, first.z);
        for pos in iter {
            bounds.min_x = bounds.min_x.min(pos.x);
            bounds.min_z = bounds.min_z.min(pos.z);
            bounds.max_x = bounds.max_x.max(pos.x);
            bounds.max_z = bounds.max_z.max(pos.z);
        }
        Some(bounds)
    }

    /// Whether both corners are within the coordinate range.
    pub fn is_valid(&self) -> bool {
        TilePos::new(self.min_x, self.min_z).is_valid()
            && TilePos::new(self.max_x, self.max_z).is_valid()
    }

    /// Round the minimum corner down and the maximum corner up to even values.
    ///
    /// Every 2×2 group touching the box is then fully enumerated by
    /// [`coarse_cells`](Self::coarse_cells), including those on the border.
    /// Requires a [valid](Self::is_valid) box.
    pub fn expand_to_even(&self) -> Self {
        Self {
            min_x: self.min_x - self.min_x.rem_euclid(2),
            min_z: self.min_z - self.min_z.rem_euclid(2),
            max_x: self.max_x + self.max_x.rem_euclid(2),
            max_z: self.max_z + self.max_z.rem_euclid(2),
        }
    }

    /// Whether a position lies inside the box (inclusive).
    pub fn contains(&self, pos: TilePos) -> bool {
        (self.min_x..=self.max_x).contains(&pos.x) && (self.min_z..=self.max_z).contains(&pos.z)
    }

    /// Number of tile columns covered.
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    /// Number of tile rows covered.
    pub fn height(&self) -> u32 {
        (self.max_z - self.min_z + 1) as u32
    }

    /// Lower-left corners of the 2×2 groups covering the box.
    ///
    /// Steps by two from the minimum corner, x outermost then z, both
    /// ascending. Call on an [`expand_to_even`](Self::expand_to_even) box.
    pub fn coarse_cells(&self) -> impl Iterator<Item = TilePos> {
        let (min_z, max_z) = (self.min_z, self.max_z);
        (self.min_x..=self.max_x)
            .step_by(2)
            .flat_map(move |x| (min_z..=max_z).step_by(2).map(move |z| TilePos::new(x, z)))
    }

    /// Number of cells [`coarse_cells`](Self::coarse_cells) yields.
    pub fn coarse_cell_count(&self) -> usize {
        let columns = (i64::from(self.max_x) - i64::from(self.min_x)) / 2 + 1;
        let rows = (i64::from(self.max_z) - i64::from(self.min_z)) / 2 + 1;
        (columns * rows) as usize
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}..={}, z={}..={}",
            self.min_x, self.max_x, self.min_z, self.max_z
        )
    }
}
