//! In-memory tile store.
//!
//! Keeps decoded images in a map, lossless and without touching disk. Used
//! by tests that need exact pixel values, and handy for dry runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbImage;
use parking_lot::RwLock;

use super::path::tile_path;
use super::{LevelScan, SkippedEntry, StoreError, StoreResult, TileStore, WriteOutcome};
use crate::coord::TileCoord;

/// Tile store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: RwLock<HashMap<TileCoord, RgbImage>>,
    writes: AtomicU64,
    reads: AtomicU64,
}

impl MemoryTileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tile unconditionally without counting it as a write.
    pub fn insert(&self, coord: TileCoord, image: RgbImage) {
        self.tiles.write().insert(coord, image);
    }

    /// Number of tiles held.
    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    /// Whether the store holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }

    /// Number of writes that stored a tile.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of successful reads.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Copy of the tile at `coord`, if any.
    pub fn get(&self, coord: TileCoord) -> Option<RgbImage> {
        self.tiles.read().get(&coord).cloned()
    }
}

impl TileStore for MemoryTileStore {
    fn exists(&self, coord: TileCoord) -> bool {
        self.tiles.read().contains_key(&coord)
    }

    fn read(&self, coord: TileCoord) -> StoreResult<RgbImage> {
        let image = self
            .tiles
            .read()
            .get(&coord)
            .cloned()
            .ok_or(StoreError::NotFound(coord))?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(image)
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
        let mut tiles = self.tiles.write();
        if !overwrite && tiles.contains_key(&coord) {
            return Ok(WriteOutcome::Kept);
        }
        tiles.insert(coord, image.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(WriteOutcome::Written)
    }

    fn scan_level(&self, lod: u32) -> StoreResult<LevelScan> {
        let mut scan = LevelScan::default();
        for coord in self.tiles.read().keys().filter(|coord| coord.lod == lod) {
            if coord.is_valid() {
                scan.positions.push(coord.pos());
            } else {
                scan.skipped.push(SkippedEntry {
                    path: tile_path(Path::new(""), *coord),
                    reason: StoreError::OutOfRange(*coord).to_string(),
                });
            }
        }
        scan.positions.sort();
        scan.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(scan)
    }

    fn levels(&self) -> StoreResult<Vec<u32>> {
        let mut levels: Vec<u32> = self.tiles.read().keys().map(|c| c.lod).collect();
        levels.sort_unstable();
        levels.dedup();
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TilePos;
    use image::Rgb;

    fn solid(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(2, 2, Rgb(color))
    }

    #[test]
    fn test_write_then_read_is_lossless() {
        let store = MemoryTileStore::new();
        let coord = TileCoord::new(0, 1, 2);
        store.write(coord, &solid([1, 2, 3]), false).unwrap();

        assert_eq!(store.read(coord).unwrap(), solid([1, 2, 3]));
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn test_write_policy() {
        let store = MemoryTileStore::new();
        let coord = TileCoord::new(0, 0, 0);
        store.write(coord, &solid([1, 1, 1]), false).unwrap();

        assert_eq!(
            store.write(coord, &solid([2, 2, 2]), false).unwrap(),
            WriteOutcome::Kept
        );
        assert_eq!(store.get(coord), Some(solid([1, 1, 1])));

        assert_eq!(
            store.write(coord, &solid([2, 2, 2]), true).unwrap(),
            WriteOutcome::Written
        );
        assert_eq!(store.get(coord), Some(solid([2, 2, 2])));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_read_missing() {
        let store = MemoryTileStore::new();
        assert!(matches!(
            store.read(TileCoord::new(0, 0, 0)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let store = MemoryTileStore::new();
        let far = TileCoord::new(0, i32::MAX, 0);

        assert!(matches!(
            store.write(far, &solid([0, 0, 0]), false),
            Err(StoreError::OutOfRange(c)) if c == far
        ));
        assert!(store.is_empty());

        store.insert(far, solid([0, 0, 0]));
        store.insert(TileCoord::new(0, 0, 0), solid([0, 0, 0]));
        let scan = store.scan_level(0).unwrap();
        assert_eq!(scan.positions, vec![TilePos::new(0, 0)]);
        assert_eq!(scan.skipped.len(), 1);
        assert!(scan.skipped[0].path.ends_with("0/2147483647/0/tile.jpg"));
    }

    #[test]
    fn test_scan_and_levels() {
        let store = MemoryTileStore::new();
        store.insert(TileCoord::new(0, 1, 0), solid([0, 0, 0]));
        store.insert(TileCoord::new(0, -1, 3), solid([0, 0, 0]));
        store.insert(TileCoord::new(2, 0, 0), solid([0, 0, 0]));

        let scan = store.scan_level(0).unwrap();
        assert_eq!(
            scan.positions,
            vec![TilePos::new(-1, 3), TilePos::new(1, 0)]
        );
        assert_eq!(store.levels().unwrap(), vec![0, 2]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.write_count(), 0);
    }
}
