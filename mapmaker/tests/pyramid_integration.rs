//! Integration tests for the on-disk tile pipeline.
//!
//! These tests run the complete flow against a real directory tree:
//! - screenshots → LOD 0 tiles
//! - LOD 0 scan → pyramid build
//! - rebuild without overwrite leaves every file byte-identical
//! - composite of a level
//!
//! Run with: `cargo test --test pyramid_integration`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use mapmaker::composite::Compositor;
use mapmaker::config::{IngestConfig, PyramidConfig};
use mapmaker::coord::TileCoord;
use mapmaker::index::TileIndex;
use mapmaker::ingest::make_initial_tiles;
use mapmaker::pyramid::{PyramidBuilder, PyramidError};
use mapmaker::store::{parse_tile_path, DiskTileStore, TileStore};

// ============================================================================
// Helper Functions
// ============================================================================

const TILE_SIZE: u32 = 16;

/// LOD-0 tiles around the origin, including negative coordinates.
const SOURCE_TILES: &[(i32, i32)] = &[(-1, -1), (0, -1), (0, 0), (1, 0), (3, 2), (5, 5)];

fn color_for(x: i32, z: i32) -> Rgb<u8> {
    Rgb([(x * 30 + 120) as u8, (z * 30 + 120) as u8, 60])
}

fn seed_store(root: &Path) -> DiskTileStore {
    let store = DiskTileStore::new(root);
    for &(x, z) in SOURCE_TILES {
        let tile = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, color_for(x, z));
        store.write(TileCoord::new(0, x, z), &tile, false).unwrap();
    }
    store
}

fn load_index(store: &DiskTileStore) -> TileIndex {
    let mut index = TileIndex::new();
    index.load(store, 0).unwrap();
    index
}

/// Every file under `root` with its contents.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(relative, fs::read(&path).unwrap());
            }
        }
    }
    let mut files = BTreeMap::new();
    walk(root, root, &mut files);
    files
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Building writes one tile per slot under the documented layout.
#[test]
fn test_build_writes_layout() {
    let temp = TempDir::new().unwrap();
    let store = seed_store(temp.path());
    let config = PyramidConfig::new().with_max_lod(3);

    let mut builder = PyramidBuilder::new(&store, load_index(&store), config).unwrap();
    let reports = builder.build_all().unwrap();

    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert_eq!(report.written, report.slots);
        assert_eq!(report.merged + report.empty, report.slots);
    }

    // (-1,-1) floors to (-1,-1) at LOD 1.
    assert!(temp.path().join("1/-1/-1/tile.jpg").is_file());
    assert!(temp.path().join("1/2/2/tile.jpg").is_file());

    // Every file on disk is a tile at a valid address, and tile-sized.
    for relative in snapshot(temp.path()).keys() {
        let coord = parse_tile_path(relative).unwrap();
        let tile = store.read(coord).unwrap();
        assert_eq!(tile.dimensions(), (TILE_SIZE, TILE_SIZE), "{}", coord);
    }

    // The scan of each built level agrees with the builder's index.
    for lod in 1..=3 {
        let mut scanned = TileIndex::new();
        scanned.load(&store, lod).unwrap();
        assert_eq!(scanned.level(lod), builder.index().level(lod), "LOD {}", lod);
    }
}

/// A second build without overwrite touches nothing on disk.
#[test]
fn test_rebuild_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let store = seed_store(temp.path());
    let config = PyramidConfig::new().with_max_lod(3);

    let mut first = PyramidBuilder::new(&store, load_index(&store), config.clone()).unwrap();
    first.build_all().unwrap();
    let before = snapshot(temp.path());

    let mut second = PyramidBuilder::new(&store, load_index(&store), config).unwrap();
    let reports = second.build_all().unwrap();

    assert!(reports.iter().all(|r| r.written == 0 && r.kept == r.slots));
    assert_eq!(snapshot(temp.path()), before);
    assert_eq!(second.index(), first.index());
}

/// Deleted tiles are regenerated on the next run; the rest are kept.
#[test]
fn test_resume_fills_missing_tiles() {
    let temp = TempDir::new().unwrap();
    let store = seed_store(temp.path());
    let config = PyramidConfig::new().with_max_lod(2);

    PyramidBuilder::new(&store, load_index(&store), config.clone())
        .unwrap()
        .build_all()
        .unwrap();
    fs::remove_file(temp.path().join("2/0/0/tile.jpg")).unwrap();

    let reports = PyramidBuilder::new(&store, load_index(&store), config)
        .unwrap()
        .build_all()
        .unwrap();

    assert_eq!(reports[0].written, 0);
    assert_eq!(reports[1].written, 1);
    assert!(store.exists(TileCoord::new(2, 0, 0)));
}

/// Malformed entries in LOD 0 are reported and left out of the build.
#[test]
fn test_malformed_entries_are_skipped() {
    let temp = TempDir::new().unwrap();
    let store = seed_store(temp.path());
    fs::create_dir_all(temp.path().join("0/abc/1")).unwrap();
    fs::create_dir_all(temp.path().join("0/7/007")).unwrap();
    fs::create_dir_all(temp.path().join("0/8/8")).unwrap();

    let mut index = TileIndex::new();
    let report = index.load(&store, 0).unwrap();

    assert_eq!(report.tiles, SOURCE_TILES.len());
    assert_eq!(report.skipped.len(), 3);
}

/// A tile directory at the edge of `i32` is skipped, and the build goes on.
#[test]
fn test_far_coordinate_directory_is_skipped() {
    let temp = TempDir::new().unwrap();
    let store = seed_store(temp.path());
    let far = temp.path().join("0/2147483647/0");
    fs::create_dir_all(&far).unwrap();
    RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([255, 255, 255]))
        .save(far.join("tile.jpg"))
        .unwrap();

    let mut index = TileIndex::new();
    let load = index.load(&store, 0).unwrap();
    assert_eq!(load.tiles, SOURCE_TILES.len());
    assert_eq!(load.skipped.len(), 1);
    assert!(load.skipped[0].path.ends_with("2147483647"));

    let mut builder =
        PyramidBuilder::new(&store, index, PyramidConfig::new().with_max_lod(1)).unwrap();
    let report = builder.build_level(1).unwrap();

    // Same slots as the tree without the far directory.
    assert_eq!(report.bounds.max_x, 6);
    assert_eq!(report.written, report.slots);
    assert!(report.slots > 0);
}

/// An empty tree fails before anything is written.
#[test]
fn test_empty_tree_fails() {
    let temp = TempDir::new().unwrap();
    let store = DiskTileStore::new(temp.path());

    let result = PyramidBuilder::new(&store, load_index(&store), PyramidConfig::default());

    assert!(matches!(result, Err(PyramidError::EmptyLevel { lod: 0 })));
    assert!(snapshot(temp.path()).is_empty());
}

/// Screenshots in, composite of the built level out.
#[test]
fn test_ingest_build_composite() {
    let temp = TempDir::new().unwrap();
    let shots = temp.path().join("shots").join("run1");
    fs::create_dir_all(&shots).unwrap();
    for (x, z) in [(0, 0), (64, 0), (0, 64), (64, 64)] {
        let frame = RgbImage::from_pixel(24, 24, Rgb([200, 100, 50]));
        frame.save(shots.join(format!("world_{x}_{z}.png"))).unwrap();
    }
    let tiles = temp.path().join("tiles");
    let store = DiskTileStore::new(&tiles);

    let ingest = IngestConfig::new().with_crop_size(20).with_overlap(-4);
    let (report, scan) = make_initial_tiles(&store, &temp.path().join("shots"), ingest).unwrap();
    assert_eq!(scan.screenshots, 4);
    assert_eq!(report.step, 64);
    assert_eq!(report.written, 4);

    let mut builder =
        PyramidBuilder::new(&store, load_index(&store), PyramidConfig::new().with_max_lod(1))
            .unwrap();
    assert_eq!(builder.tile_size(), 16);
    let level = builder.build_level(1).unwrap();
    // The 2x2 block rounds out to x, z in 0..=2: one merged slot, three empty.
    assert_eq!(level.slots, 4);
    assert_eq!(level.merged, 1);
    assert_eq!(level.empty, 3);

    let output = temp.path().join("map.jpg");
    let (width, height) = Compositor::new(&store, builder.index())
        .composite_to_file(0, None, &output, 90)
        .unwrap();
    assert_eq!((width, height), (32, 32));
    assert!(output.is_file());
}
