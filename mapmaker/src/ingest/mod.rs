//! Screenshot ingestion: raw captures in, LOD-0 tiles out.
//!
//! ```text
//! <input>/<run>/<prefix>_<x>_<z>.png ─┐
//! <input>/<run>/<prefix>_<x>_<z>_tile.png ─┤  ScreenshotSet::from_directory
//!                                          ▼
//!                        world (x, z) ──► grid (x div step, z div step)
//!                                          │  center crop to crop_size + overlap
//!                                          ▼
//!                               TileStore::write(LOD 0)
//! ```
//!
//! Screenshots are taken on a regular world-space grid, one camera position
//! every `step` units. Each frame covers a little more than its grid cell;
//! the negative overlap trims the seam between neighbours.

mod error;
mod filename;
mod screenshot;

pub use error::{IngestError, IngestResult};
pub use filename::{parse_screenshot_filename, FilenameError, ScreenshotKind, ScreenshotName};
pub use screenshot::{ScanReport, Screenshot, ScreenshotSet};

use std::collections::HashMap;
use std::path::Path;

use image::imageops;
use image::RgbImage;
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::coord::{BoundingBox, TileCoord, TilePos};
use crate::store::{TileStore, WriteOutcome};

/// Callback invoked after each screenshot is handled: `(done, total)`.
pub type IngestProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Summary of an ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// World-space spacing used to derive grid coordinates.
    pub step: i32,
    /// Edge length of the produced tiles.
    pub tile_size: u32,
    /// Grid bounds of the produced tiles.
    pub bounds: BoundingBox,
    pub written: usize,
    /// Tiles already present and left as they were.
    pub kept: usize,
}

/// Cut the centered `size × size` square out of `image`.
///
/// When the margin is odd the extra pixel is dropped from the right and
/// bottom edges.
pub fn center_crop(image: &RgbImage, size: u32, path: &Path) -> IngestResult<RgbImage> {
    let (width, height) = image.dimensions();
    if width < size || height < size {
        return Err(IngestError::ImageTooSmall {
            path: path.to_path_buf(),
            width,
            height,
            size,
        });
    }
    let left = (width - size) / 2;
    let top = (height - size) / 2;
    Ok(imageops::crop_imm(image, left, top, size, size).to_image())
}

/// Turns a [`ScreenshotSet`] into LOD-0 tiles.
pub struct TileIngester<'a, S: TileStore + ?Sized> {
    store: &'a S,
    config: IngestConfig,
    progress: Option<IngestProgressCallback>,
}

impl<'a, S: TileStore + ?Sized> TileIngester<'a, S> {
    pub fn new(store: &'a S, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: IngestProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Write one LOD-0 tile per screenshot.
    ///
    /// All grid positions are computed before anything is written, so a
    /// spacing that makes two screenshots collide fails without touching
    /// the store. With `skip_existing`, tiles already in the store are kept
    /// and their screenshots are not even decoded.
    ///
    /// # Errors
    ///
    /// - [`IngestError::NoScreenshots`] for an empty set
    /// - [`IngestError::UndeterminedStep`] if the spacing can't be inferred
    /// - [`IngestError::GridCollision`] if two screenshots share a grid cell
    /// - [`IngestError::OutOfRange`] if a grid cell is beyond the coordinate range
    /// - [`IngestError::ImageTooSmall`] if a frame is smaller than the crop
    pub fn run(&self, set: &ScreenshotSet) -> IngestResult<IngestReport> {
        self.config.validate()?;
        if set.is_empty() {
            return Err(IngestError::NoScreenshots);
        }

        let step = set.step(self.config.step)?;
        let tile_size = self.config.tile_size();
        let placements = place_on_grid(set, step)?;
        let bounds = BoundingBox::from_positions(placements.iter().map(|(pos, _)| *pos))
            .ok_or(IngestError::NoScreenshots)?;
        info!(
            screenshots = placements.len(),
            step,
            tile_size,
            bounds = %bounds,
            "Creating LOD 0 tiles"
        );

        let overwrite = !self.config.skip_existing;
        let total = placements.len();
        let mut written = 0;
        let mut kept = 0;

        for (done, (pos, screenshot)) in placements.into_iter().enumerate() {
            let coord = pos.at(0);
            let outcome = self.ingest_one(coord, screenshot, tile_size, overwrite)?;
            match outcome {
                WriteOutcome::Written => written += 1,
                WriteOutcome::Kept => kept += 1,
            }
            if let Some(progress) = &self.progress {
                progress(done + 1, total);
            }
        }

        info!(written, kept, "Finished LOD 0");
        Ok(IngestReport {
            step,
            tile_size,
            bounds,
            written,
            kept,
        })
    }

    fn ingest_one(
        &self,
        coord: TileCoord,
        screenshot: &Screenshot,
        tile_size: u32,
        overwrite: bool,
    ) -> IngestResult<WriteOutcome> {
        if !overwrite && self.store.exists(coord) {
            debug!(tile = %coord, "Tile exists, skipping");
            return Ok(WriteOutcome::Kept);
        }
        let source = screenshot.source();

        let image = image::open(source)
            .map_err(|source_err| IngestError::Image {
                path: source.to_path_buf(),
                source: source_err,
            })?
            .to_rgb8();
        let tile = center_crop(&image, tile_size, source)?;
        drop(image);

        debug!(tile = %coord, source = %source.display(), "Creating tile");
        Ok(self.store.write(coord, &tile, overwrite)?)
    }
}

/// Grid position of every screenshot, in set order.
fn place_on_grid(set: &ScreenshotSet, step: i32) -> IngestResult<Vec<(TilePos, &Screenshot)>> {
    let mut taken: HashMap<TilePos, &Screenshot> = HashMap::with_capacity(set.len());
    let mut placements = Vec::with_capacity(set.len());

    for screenshot in set.iter() {
        let pos = screenshot.grid_position(step);
        if !pos.is_valid() {
            return Err(IngestError::OutOfRange {
                path: screenshot.source().to_path_buf(),
                x: pos.x,
                z: pos.z,
            });
        }
        if let Some(existing) = taken.insert(pos, screenshot) {
            return Err(IngestError::GridCollision {
                path: screenshot.source().to_path_buf(),
                existing: existing.source().to_path_buf(),
                x: pos.x,
                z: pos.z,
            });
        }
        placements.push((pos, screenshot));
    }
    Ok(placements)
}

/// Scan `input` and write its screenshots to `store` as LOD-0 tiles.
pub fn make_initial_tiles<S>(
    store: &S,
    input: &Path,
    config: IngestConfig,
) -> IngestResult<(IngestReport, ScanReport)>
where
    S: TileStore + ?Sized,
{
    let (set, scan) = ScreenshotSet::from_directory(input)?;
    let report = TileIngester::new(store, config).run(&set)?;
    Ok((report, scan))
}
