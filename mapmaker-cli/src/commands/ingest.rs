//! `mapmaker ingest`: crop screenshots into LOD-0 tiles.

use std::path::PathBuf;

use clap::Args;
use mapmaker::config::{ConfigFile, IngestConfig};
use mapmaker::ingest::{ScreenshotSet, TileIngester};
use mapmaker::store::DiskTileStore;

use super::common::{print_skipped, progress_bar};
use crate::error::CliError;

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory holding one subdirectory per capture run
    pub screenshots: PathBuf,

    /// Tile tree root to write LOD 0 into
    pub output: PathBuf,

    /// Side of the square cut from each screenshot, in pixels
    #[arg(long)]
    pub crop_size: Option<u32>,

    /// Pixels added to the crop; negative values trim the seams
    #[arg(long, allow_hyphen_values = true)]
    pub overlap: Option<i32>,

    /// World units between neighbouring screenshots (inferred when omitted)
    #[arg(long)]
    pub step: Option<i32>,

    /// JPEG quality for written tiles (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Recreate tiles that already exist
    #[arg(short = 'f', long)]
    pub force_overwrite: bool,
}

impl IngestArgs {
    /// Settings from the config file with command-line overrides applied.
    pub fn resolve(&self, file: &ConfigFile) -> Result<IngestConfig, CliError> {
        let mut config = file.ingest.clone();
        if let Some(crop_size) = self.crop_size {
            config = config.with_crop_size(crop_size);
        }
        if let Some(overlap) = self.overlap {
            config = config.with_overlap(overlap);
        }
        if let Some(step) = self.step {
            config = config.with_step(step);
        }
        if let Some(quality) = self.quality {
            config = config.with_jpeg_quality(quality);
        }
        if self.force_overwrite {
            config = config.with_skip_existing(false);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the ingest command.
pub fn run(args: IngestArgs, file: &ConfigFile) -> Result<(), CliError> {
    let config = args.resolve(file)?;
    let store = DiskTileStore::new(&args.output).with_jpeg_quality(config.jpeg_quality);

    let (set, scan) = ScreenshotSet::from_directory(&args.screenshots)?;
    println!(
        "Found {} screenshots in {} files under {}",
        scan.screenshots,
        scan.files,
        args.screenshots.display()
    );
    print_skipped(&scan.skipped);

    let bar = progress_bar(set.len() as u64);
    bar.set_message("LOD 0");
    let callback_bar = bar.clone();
    let ingester = TileIngester::new(&store, config)
        .with_progress(Box::new(move |done, _total| callback_bar.set_position(done as u64)));

    let report = ingester.run(&set).map_err(|e| {
        bar.abandon();
        e
    })?;
    bar.finish_and_clear();

    println!(
        "Step {} world units, {}px tiles covering {}",
        report.step, report.tile_size, report.bounds
    );
    println!("{} tiles written, {} kept", report.written, report.kept);
    if !scan.skipped.is_empty() {
        println!("Skipped {} files", scan.skipped.len());
    }
    Ok(())
}
