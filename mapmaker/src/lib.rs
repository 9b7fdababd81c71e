//! Mapmaker - LOD tile pyramids from game world screenshots
//!
//! This library turns a grid of overlapping screenshots into the
//! `<lod>/<x>/<z>/tile.jpg` tile tree consumed by leaflet-style map viewers.
//!
//! # Pipeline
//!
//! 1. [`ingest`] crops screenshots into LOD-0 tiles.
//! 2. [`index::TileIndex::load`] scans LOD 0 from a [`store::TileStore`].
//! 3. [`pyramid::PyramidBuilder`] merges 2×2 groups into each coarser level.
//! 4. [`composite`] stitches a level into one image for visual checks.

pub mod composite;
pub mod config;
pub mod coord;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod pyramid;
pub mod store;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
