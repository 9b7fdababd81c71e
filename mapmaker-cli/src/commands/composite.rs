//! `mapmaker composite`: stitch one level into a single JPEG.

use std::path::PathBuf;

use clap::Args;
use mapmaker::composite::Compositor;
use mapmaker::config::ConfigFile;
use mapmaker::coord::BoundingBox;
use mapmaker::index::TileIndex;
use mapmaker::store::DiskTileStore;

use super::common::print_skipped;
use crate::error::CliError;

/// Arguments for the composite command.
#[derive(Debug, Args)]
pub struct CompositeArgs {
    /// Tile tree root
    pub dir: PathBuf,

    /// Output image path
    pub output: PathBuf,

    /// Level to composite
    #[arg(long, default_value_t = 0)]
    pub lod: u32,

    /// West edge of the area, in tiles (all four edges or none)
    #[arg(long, allow_hyphen_values = true)]
    pub min_x: Option<i32>,

    /// South edge of the area
    #[arg(long, allow_hyphen_values = true)]
    pub min_z: Option<i32>,

    /// East edge of the area
    #[arg(long, allow_hyphen_values = true)]
    pub max_x: Option<i32>,

    /// North edge of the area
    #[arg(long, allow_hyphen_values = true)]
    pub max_z: Option<i32>,

    /// Pixels between neighbouring tiles; negative values overlap them
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub overlap: i32,
}

impl CompositeArgs {
    /// The requested area, or `None` for the whole level.
    pub fn area(&self) -> Result<Option<BoundingBox>, CliError> {
        match (self.min_x, self.min_z, self.max_x, self.max_z) {
            (None, None, None, None) => Ok(None),
            (Some(min_x), Some(min_z), Some(max_x), Some(max_z)) => {
                if min_x > max_x || min_z > max_z {
                    return Err(CliError::InvalidArguments(format!(
                        "empty area: x {}..={}, z {}..={}",
                        min_x, max_x, min_z, max_z
                    )));
                }
                Ok(Some(BoundingBox::new(min_x, min_z, max_x, max_z)))
            }
            _ => Err(CliError::InvalidArguments(
                "--min-x, --min-z, --max-x and --max-z must be given together".to_string(),
            )),
        }
    }
}

/// Run the composite command.
pub fn run(args: CompositeArgs, file: &ConfigFile) -> Result<(), CliError> {
    let area = args.area()?;
    let store = DiskTileStore::new(&args.dir);

    let mut index = TileIndex::new();
    let load = index.load(&store, args.lod)?;
    print_skipped(&load.skipped);

    let (width, height) = Compositor::new(&store, &index)
        .with_background(file.pyramid.background_color)
        .with_overlap(args.overlap)
        .composite_to_file(args.lod, area, &args.output, file.pyramid.jpeg_quality)?;

    println!(
        "Wrote {}x{} composite of LOD {} to {}",
        width,
        height,
        args.lod,
        args.output.display()
    );
    Ok(())
}
