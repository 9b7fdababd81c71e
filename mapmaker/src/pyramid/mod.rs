//! Tile pyramid construction.
//!
//! Turns the LOD-0 tiles of a store into progressively coarser levels.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PyramidBuilder                         │
//! │   build_all() ──► build_level(1) ──► ... ──► build_level(N) │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │ tiles_in_rect / bounds      │ read / write
//!                 ▼                             ▼
//!         ┌──────────────┐              ┌──────────────┐
//!         │  TileIndex   │              │  TileStore   │
//!         └──────────────┘              └──────────────┘
//! ```
//!
//! Each level is derived only from the level directly below it. A level
//! build either completes or returns an error; there is no partial success,
//! since every coarser level would inherit the gap.
//!
//! A build run assumes exclusive ownership of the store. The index is
//! scanned once up front and is not refreshed if the store is modified
//! externally while the build runs.

mod builder;
mod error;
mod merge;

pub use builder::{LevelReport, ProgressCallback, PyramidBuilder, SlotKind, SlotProgress};
pub use error::{PyramidError, PyramidResult};
pub use merge::{blank_tile, compose_group, merge_group, quadrant_offset, DOWNSCALE_FILTER};
