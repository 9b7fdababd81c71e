//! Filesystem tile store writing JPEG files in the viewer layout.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::{debug, warn};

use super::path::{level_dir, parse_coordinate, parse_lod, tile_path, TILE_FILENAME};
use super::{LevelScan, SkippedEntry, StoreError, StoreResult, TileStore, WriteOutcome};
use crate::config::DEFAULT_JPEG_QUALITY;
use crate::coord::{TileCoord, TilePos};

/// Suffix of the temporary file a tile is written to before being renamed.
const TEMP_SUFFIX: &str = ".tmp";

/// Tile store rooted at a directory on disk.
///
/// Tiles live at `<root>/<lod>/<x>/<z>/tile.jpg`. Writes go to a temporary
/// sibling file first and are renamed into place, so a reader never sees a
/// half-written tile and an interrupted run never leaves one behind.
#[derive(Debug, Clone)]
pub struct DiskTileStore {
    root: PathBuf,
    jpeg_quality: u8,
}

impl DiskTileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the JPEG quality used for writes.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// JPEG quality used for writes.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Path of the file backing a tile.
    pub fn path_for(&self, coord: TileCoord) -> PathBuf {
        tile_path(&self.root, coord)
    }
}

impl TileStore for DiskTileStore {
    fn exists(&self, coord: TileCoord) -> bool {
        self.path_for(coord).is_file()
    }

    fn read(&self, coord: TileCoord) -> StoreResult<RgbImage> {
        let path = self.path_for(coord);
        if !path.is_file() {
            return Err(StoreError::NotFound(coord));
        }
        let image = image::open(&path).map_err(|e| StoreError::image(&path, e))?;
        Ok(image.into_rgb8())
    }

    fn write(
        &self,
        coord: TileCoord,
        image: &RgbImage,
        overwrite: bool,
    ) -> StoreResult<WriteOutcome> {
        if !coord.is_valid() {
            return Err(StoreError::OutOfRange(coord));
        }
        let path = self.path_for(coord);
        if !overwrite && path.is_file() {
            return Ok(WriteOutcome::Kept);
        }
        save_jpeg(&path, image, self.jpeg_quality)?;
        debug!(tile = %coord, path = %path.display(), "Wrote tile");
        Ok(WriteOutcome::Written)
    }

    fn scan_level(&self, lod: u32) -> StoreResult<LevelScan> {
        let dir = level_dir(&self.root, lod);
        let mut scan = LevelScan::default();
        if !dir.is_dir() {
            return Ok(scan);
        }

        for (x_path, x_name) in sorted_entries(&dir)? {
            if is_hidden(&x_name) {
                skip(&mut scan, x_path, "hidden entry");
                continue;
            }
            if !x_path.is_dir() {
                skip(&mut scan, x_path, "not a directory");
                continue;
            }
            let x = match parse_coordinate('x', &x_name) {
                Ok(x) => x,
                Err(e) => {
                    skip(&mut scan, x_path, e.to_string());
                    continue;
                }
            };

            for (z_path, z_name) in sorted_entries(&x_path)? {
                if is_hidden(&z_name) {
                    skip(&mut scan, z_path, "hidden entry");
                    continue;
                }
                if !z_path.is_dir() {
                    skip(&mut scan, z_path, "not a directory");
                    continue;
                }
                let z = match parse_coordinate('z', &z_name) {
                    Ok(z) => z,
                    Err(e) => {
                        skip(&mut scan, z_path, e.to_string());
                        continue;
                    }
                };
                if !z_path.join(TILE_FILENAME).is_file() {
                    skip(&mut scan, z_path, format!("missing {}", TILE_FILENAME));
                    continue;
                }
                scan.positions.push(TilePos::new(x, z));
            }
        }

        scan.positions.sort();
        Ok(scan)
    }

    fn levels(&self) -> StoreResult<Vec<u32>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut levels: Vec<u32> = sorted_entries(&self.root)?
            .into_iter()
            .filter(|(path, name)| path.is_dir() && !is_hidden(name))
            .filter_map(|(_, name)| match parse_lod(&name) {
                Ok(lod) => Some(lod),
                Err(e) => {
                    debug!(error = %e, "Ignoring non-level directory");
                    None
                }
            })
            .collect();
        levels.sort_unstable();
        Ok(levels)
    }
}

/// Encode an image as JPEG and write it to `path`.
///
/// Parent directories are created as needed. The data is written to a
/// temporary file next to `path` and renamed over it once complete.
pub fn save_jpeg(path: &Path, image: &RgbImage, quality: u8) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(TEMP_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    let result = write_jpeg_file(&temp_path, image, quality)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_jpeg_file(path: &Path, image: &RgbImage, quality: u8) -> StoreResult<()> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(image)
        .map_err(|e| StoreError::image(path, e))?;
    writer.flush().map_err(|e| StoreError::io(path, e))
}

/// Directory entries with their UTF-8 names, sorted by path.
///
/// Entries whose names are not valid UTF-8 cannot be tile coordinates and
/// are returned with a lossy name so the caller reports them.
fn sorted_entries(dir: &Path) -> StoreResult<Vec<(PathBuf, String)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        entries.push((entry.path(), name));
    }
    entries.sort();
    Ok(entries)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn skip(scan: &mut LevelScan, path: PathBuf, reason: impl Into<String>) {
    let reason = reason.into();
    warn!(path = %path.display(), reason = %reason, "Skipping malformed tile entry");
    scan.skipped.push(SkippedEntry { path, reason });
}
