//! Large-map compositing for visual checks.
//!
//! Lays every tile of one level (or a rectangle of it) side by side on a
//! single image, north up. Useful to eyeball seams and crop settings before
//! building the full pyramid; nothing else in the crate depends on it.

use std::path::Path;

use image::{Rgb, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DEFAULT_BACKGROUND_COLOR;
use crate::coord::{BoundingBox, TileCoord};
use crate::index::TileIndex;
use crate::store::{save_jpeg, StoreError, TileStore};

/// Errors raised while compositing.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// Nothing to draw.
    #[error("no tiles found at LOD {lod} in the selected area")]
    EmptyLevel { lod: u32 },

    /// Negative overlap would swallow whole tiles.
    #[error("overlap {overlap} is invalid for {tile_size}px tiles")]
    InvalidOverlap { overlap: i32, tile_size: u32 },

    /// Tiles of one level differ in size.
    #[error("tile {coord} is {width}x{height}, expected {expected}x{expected}")]
    TileSizeMismatch {
        coord: TileCoord,
        expected: u32,
        width: u32,
        height: u32,
    },

    /// Reading a tile or writing the output failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for compositing.
pub type CompositeResult<T> = Result<T, CompositeError>;

/// Assembles same-level tiles into one image.
pub struct Compositor<'a, S: TileStore + ?Sized> {
    store: &'a S,
    index: &'a TileIndex,
    background: Rgb<u8>,
    overlap: i32,
}

impl<'a, S: TileStore + ?Sized> Compositor<'a, S> {
    /// Create a compositor drawing the tiles `index` knows about from `store`.
    pub fn new(store: &'a S, index: &'a TileIndex) -> Self {
        Self {
            store,
            index,
            background: DEFAULT_BACKGROUND_COLOR,
            overlap: 0,
        }
    }

    /// Fill color for cells without a tile.
    pub fn with_background(mut self, color: Rgb<u8>) -> Self {
        self.background = color;
        self
    }

    /// Pixels added between neighbouring tiles. Negative values make them
    /// overlap, later tiles (by x, then z) drawn on top.
    pub fn with_overlap(mut self, overlap: i32) -> Self {
        self.overlap = overlap;
        self
    }

    /// Composite the tiles of `lod` inside `rect` (inclusive), or the whole
    /// level when `rect` is `None`.
    ///
    /// The canvas spans the rectangle, not just the tiles found in it, so
    /// cells without a tile show the background color. The tile size is
    /// taken from the first tile drawn.
    ///
    /// # Errors
    ///
    /// - [`CompositeError::EmptyLevel`] if no tile falls inside the selection
    /// - [`CompositeError::InvalidOverlap`] if `overlap <= -tile_size`
    /// - [`CompositeError::TileSizeMismatch`] if tiles differ in size
    pub fn composite(&self, lod: u32, rect: Option<BoundingBox>) -> CompositeResult<RgbImage> {
        let area = match rect {
            Some(rect) => rect,
            None => self
                .index
                .bounding_box(lod)
                .map_err(|_| CompositeError::EmptyLevel { lod })?,
        };
        let tiles = self.index.tiles_in_rect(lod, area);
        let Some(&first) = tiles.first() else {
            return Err(CompositeError::EmptyLevel { lod });
        };

        let first_image = self.store.read(first)?;
        let tile_size = first_image.width();
        drop(first_image);

        let pitch = tile_size as i64 + self.overlap as i64;
        if pitch <= 0 {
            return Err(CompositeError::InvalidOverlap {
                overlap: self.overlap,
                tile_size,
            });
        }

        let span = |units: u32| (units as i64 - 1) * pitch + tile_size as i64;
        let width = span(area.width()) as u32;
        let height = span(area.height()) as u32;
        info!(
            lod,
            area = %area,
            tiles = tiles.len(),
            width,
            height,
            "Compositing level"
        );

        let mut canvas = RgbImage::from_pixel(width, height, self.background);
        for coord in tiles {
            let image = self.store.read(coord)?;
            if image.dimensions() != (tile_size, tile_size) {
                return Err(CompositeError::TileSizeMismatch {
                    coord,
                    expected: tile_size,
                    width: image.width(),
                    height: image.height(),
                });
            }

            let column = (coord.x - area.min_x) as i64;
            let row = (area.max_z - coord.z) as i64;
            let (px, py) = (column * pitch, row * pitch);
            debug!(tile = %coord, px, py, "Placing tile");
            image::imageops::replace(&mut canvas, &image, px, py);
        }

        Ok(canvas)
    }

    /// Composite and save as JPEG at `path`.
    pub fn composite_to_file(
        &self,
        lod: u32,
        rect: Option<BoundingBox>,
        path: &Path,
        quality: u8,
    ) -> CompositeResult<(u32, u32)> {
        let canvas = self.composite(lod, rect)?;
        save_jpeg(path, &canvas, quality)?;
        info!(path = %path.display(), "Saved composite");
        Ok(canvas.dimensions())
    }
}
