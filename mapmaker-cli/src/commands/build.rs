//! `mapmaker build`: generate LOD 1..=max from the LOD-0 tiles of a tree.

use std::path::PathBuf;

use clap::Args;
use image::Rgb;
use mapmaker::config::{ConfigFile, PyramidConfig};
use mapmaker::index::TileIndex;
use mapmaker::pyramid::{PyramidBuilder, SlotProgress};
use mapmaker::store::{DiskTileStore, TileStore};

use super::common::{parse_color, print_skipped, progress_bar};
use crate::error::CliError;

/// Arguments for the build command.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Tile tree root, holding 0/<x>/<z>/tile.jpg
    pub dir: PathBuf,

    /// Coarsest level to build
    #[arg(long)]
    pub max_lod: Option<u32>,

    /// Fill color for empty tiles (#RRGGBB)
    #[arg(long, value_parser = parse_color)]
    pub background: Option<Rgb<u8>>,

    /// Regenerate tiles that already exist
    #[arg(short = 'f', long)]
    pub force_overwrite: bool,

    /// JPEG quality for written tiles (1-100)
    #[arg(long)]
    pub quality: Option<u8>,
}

impl BuildArgs {
    /// Settings from the config file with command-line overrides applied.
    pub fn resolve(&self, file: &ConfigFile) -> Result<PyramidConfig, CliError> {
        let mut config = file.pyramid.clone();
        if let Some(max_lod) = self.max_lod {
            config = config.with_max_lod(max_lod);
        }
        if let Some(color) = self.background {
            config = config.with_background_color(color);
        }
        if self.force_overwrite {
            config = config.with_overwrite_existing(true);
        }
        if let Some(quality) = self.quality {
            config = config.with_jpeg_quality(quality);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the build command.
pub fn run(args: BuildArgs, file: &ConfigFile) -> Result<(), CliError> {
    let config = args.resolve(file)?;
    let store = DiskTileStore::new(&args.dir).with_jpeg_quality(config.jpeg_quality);

    let mut index = TileIndex::new();
    let load = index.load(&store, 0)?;
    println!("Loaded {} LOD 0 tiles from {}", load.tiles, args.dir.display());
    print_skipped(&load.skipped);

    let built: Vec<u32> = store.levels()?.into_iter().filter(|&lod| lod > 0).collect();
    if !built.is_empty() && !config.overwrite_existing {
        println!("Levels {:?} already present, existing tiles will be kept", built);
    }

    let bar = progress_bar(0);
    let callback_bar = bar.clone();
    let max_lod = config.max_lod;
    let mut builder = PyramidBuilder::new(&store, index, config)?.with_progress(Box::new(
        move |progress: &SlotProgress| {
            if progress.completed == 1 {
                callback_bar.reset();
                callback_bar.set_length(progress.total as u64);
                callback_bar.set_message(format!("LOD {}", progress.lod));
            }
            callback_bar.inc(1);
        },
    ));
    println!("Tile size: {}px", builder.tile_size());

    for lod in 1..=max_lod {
        let report = builder.build_level(lod).map_err(|e| {
            bar.abandon();
            e
        })?;
        bar.suspend(|| println!("{}", report));
    }
    bar.finish_and_clear();

    println!("{}", builder.index());
    if !load.skipped.is_empty() {
        println!("Skipped {} malformed LOD 0 entries", load.skipped.len());
    }
    Ok(())
}
