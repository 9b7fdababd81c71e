//! Merging a 2×2 group of tiles into one coarser tile.
//!
//! The group's fine tiles are pasted onto a `2T × 2T` canvas pre-filled with
//! the background color, then the canvas is downscaled to `T × T` with a
//! Lanczos filter. World `z` grows north while image rows grow downward, so
//! the `z + 1` row of the group goes on top:
//!
//! ```text
//!            canvas (2T × 2T)
//!        ┌────────────┬────────────┐
//!        │ (x, z+1)   │ (x+1, z+1) │   rows 0..T
//!        ├────────────┼────────────┤
//!        │ (x, z)     │ (x+1, z)   │   rows T..2T
//!        └────────────┴────────────┘
//! ```
//!
//! Neighbouring coarse tiles are built independently and only stitch
//! seamlessly if every one of them follows this placement.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::warn;

use super::error::{PyramidError, PyramidResult};
use crate::coord::{TileCoord, TilePos};
use crate::store::TileStore;

/// Resampling filter for the 2:1 downscale.
pub const DOWNSCALE_FILTER: FilterType = FilterType::Lanczos3;

/// A tile filled with a single color.
pub fn blank_tile(tile_size: u32, background: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(tile_size, tile_size, background)
}

/// Pixel offset of a group member on the `2T × 2T` canvas.
///
/// `qx` and `qz` are the member's offsets (0 or 1) from the group's
/// lower-left fine tile.
pub fn quadrant_offset(qx: u32, qz: u32, tile_size: u32) -> (u32, u32) {
    (qx * tile_size, (1 - qz) * tile_size)
}

/// Paste the members of the group whose lower-left fine tile is `origin`
/// onto a background-filled `2T × 2T` canvas.
///
/// Members are matched to quadrants by coordinate, never by their position
/// in `members`. Each source image is loaded only while it is being pasted.
/// Members that fall outside the group are ignored.
pub fn compose_group<S>(
    store: &S,
    origin: TileCoord,
    members: &[TileCoord],
    tile_size: u32,
    background: Rgb<u8>,
) -> PyramidResult<RgbImage>
where
    S: TileStore + ?Sized,
{
    let mut canvas = blank_tile(tile_size * 2, background);

    for member in members {
        let in_group = member.lod == origin.lod
            && (origin.x..=origin.x + 1).contains(&member.x)
            && (origin.z..=origin.z + 1).contains(&member.z);
        if !in_group {
            warn!(tile = %member, group = %origin, "Tile does not belong to merge group");
        }
    }

    for qx in 0..2u32 {
        for qz in 0..2u32 {
            let target = TilePos::new(origin.x + qx as i32, origin.z + qz as i32);
            let Some(member) = members
                .iter()
                .find(|m| m.lod == origin.lod && m.pos() == target)
            else {
                continue;
            };

            let image = store.read(*member)?;
            let (width, height) = image.dimensions();
            if width != tile_size || height != tile_size {
                return Err(PyramidError::TileSizeMismatch {
                    coord: *member,
                    expected: tile_size,
                    width,
                    height,
                });
            }

            let (px, py) = quadrant_offset(qx, qz, tile_size);
            imageops::replace(&mut canvas, &image, px as i64, py as i64);
        }
    }

    Ok(canvas)
}

/// Merge a group into a single `T × T` tile.
pub fn merge_group<S>(
    store: &S,
    origin: TileCoord,
    members: &[TileCoord],
    tile_size: u32,
    background: Rgb<u8>,
) -> PyramidResult<RgbImage>
where
    S: TileStore + ?Sized,
{
    let canvas = compose_group(store, origin, members, tile_size, background)?;
    Ok(imageops::resize(&canvas, tile_size, tile_size, DOWNSCALE_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTileStore, StoreError};

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BACKGROUND: Rgb<u8> = Rgb([0x2B, 0x3D, 0x49]);

    fn store_with(tile_size: u32, tiles: &[((i32, i32), Rgb<u8>)]) -> MemoryTileStore {
        let store = MemoryTileStore::new();
        for &((x, z), color) in tiles {
            store.insert(
                TileCoord::new(0, x, z),
                RgbImage::from_pixel(tile_size, tile_size, color),
            );
        }
        store
    }

    fn coords(positions: &[(i32, i32)]) -> Vec<TileCoord> {
        positions
            .iter()
            .map(|&(x, z)| TileCoord::new(0, x, z))
            .collect()
    }

    fn assert_close(actual: &Rgb<u8>, expected: Rgb<u8>) {
        for (a, e) in actual.0.iter().zip(expected.0) {
            assert!(
                (*a as i32 - e as i32).abs() <= 2,
                "pixel {:?} not close to {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_quadrant_offset_flips_z() {
        assert_eq!(quadrant_offset(0, 0, 10), (0, 10));
        assert_eq!(quadrant_offset(1, 0, 10), (10, 10));
        assert_eq!(quadrant_offset(0, 1, 10), (0, 0));
        assert_eq!(quadrant_offset(1, 1, 10), (10, 0));
    }

    #[test]
    fn test_compose_places_quadrants_with_z_flip() {
        let store = store_with(
            2,
            &[((0, 0), RED), ((1, 0), GREEN), ((0, 1), BLUE), ((1, 1), WHITE)],
        );
        let members = coords(&[(0, 0), (1, 0), (0, 1), (1, 1)]);

        let canvas =
            compose_group(&store, TileCoord::new(0, 0, 0), &members, 2, BACKGROUND).unwrap();

        assert_eq!(canvas.dimensions(), (4, 4));
        // (0,1) is north-west: top-left of the image.
        assert_eq!(*canvas.get_pixel(0, 0), BLUE);
        assert_eq!(*canvas.get_pixel(3, 0), WHITE);
        assert_eq!(*canvas.get_pixel(0, 3), RED);
        assert_eq!(*canvas.get_pixel(3, 3), GREEN);
    }

    #[test]
    fn test_compose_matches_by_coordinate_not_order() {
        let store = store_with(2, &[((4, 6), RED), ((5, 7), GREEN)]);
        let members = coords(&[(5, 7), (4, 6)]);

        let canvas =
            compose_group(&store, TileCoord::new(0, 4, 6), &members, 2, BACKGROUND).unwrap();

        assert_eq!(*canvas.get_pixel(0, 2), RED);
        assert_eq!(*canvas.get_pixel(2, 0), GREEN);
        assert_eq!(*canvas.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*canvas.get_pixel(2, 2), BACKGROUND);
    }

    #[test]
    fn test_compose_ignores_tiles_outside_group() {
        let store = store_with(2, &[((0, 0), RED), ((2, 0), GREEN)]);
        let members = coords(&[(0, 0), (2, 0)]);

        let canvas =
            compose_group(&store, TileCoord::new(0, 0, 0), &members, 2, BACKGROUND).unwrap();

        assert_eq!(*canvas.get_pixel(2, 2), BACKGROUND);
        assert_eq!(*canvas.get_pixel(0, 2), RED);
    }

    #[test]
    fn test_merge_downscales_with_quadrant_colors() {
        let store = store_with(
            16,
            &[((0, 0), RED), ((1, 0), GREEN), ((0, 1), BLUE), ((1, 1), WHITE)],
        );
        let members = coords(&[(0, 0), (1, 0), (0, 1), (1, 1)]);

        let merged =
            merge_group(&store, TileCoord::new(0, 0, 0), &members, 16, BACKGROUND).unwrap();

        assert_eq!(merged.dimensions(), (16, 16));
        assert_close(merged.get_pixel(4, 4), BLUE);
        assert_close(merged.get_pixel(11, 4), WHITE);
        assert_close(merged.get_pixel(4, 11), RED);
        assert_close(merged.get_pixel(11, 11), GREEN);
    }

    #[test]
    fn test_merge_with_no_members_is_background() {
        let store = MemoryTileStore::new();
        let merged = merge_group(&store, TileCoord::new(0, 0, 0), &[], 8, BACKGROUND).unwrap();
        for pixel in merged.pixels() {
            assert_close(pixel, BACKGROUND);
        }
    }

    #[test]
    fn test_merge_rejects_mismatched_tile_size() {
        let store = store_with(4, &[((0, 0), RED)]);
        let err = merge_group(
            &store,
            TileCoord::new(0, 0, 0),
            &coords(&[(0, 0)]),
            8,
            BACKGROUND,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PyramidError::TileSizeMismatch {
                expected: 8,
                width: 4,
                height: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_merge_surfaces_missing_tile() {
        let store = MemoryTileStore::new();
        let err = merge_group(
            &store,
            TileCoord::new(0, 0, 0),
            &coords(&[(1, 1)]),
            8,
            BACKGROUND,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PyramidError::Store(StoreError::NotFound(_))
        ));
    }
}
