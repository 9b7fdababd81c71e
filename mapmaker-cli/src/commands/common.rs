//! Helpers shared across CLI commands.

use std::path::Path;

use image::Rgb;
use indicatif::{ProgressBar, ProgressStyle};
use mapmaker::config::{parse_hex_color, ConfigFile};
use mapmaker::store::SkippedEntry;

use crate::error::CliError;

/// Load the config file given with `--config`, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_or_default(path)?)
}

/// clap value parser for `#RRGGBB` colors.
pub fn parse_color(s: &str) -> Result<Rgb<u8>, String> {
    parse_hex_color(s).map_err(|e| e.to_string())
}

/// Progress bar for a run of `len` items.
pub fn progress_bar(len: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{msg:>8} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    let bar = ProgressBar::new(len);
    bar.set_style(style);
    bar
}

/// Print the entries a scan left out.
pub fn print_skipped(skipped: &[SkippedEntry]) {
    if skipped.is_empty() {
        return;
    }
    println!("Skipped {} entries:", skipped.len());
    for entry in skipped {
        println!("  {}: {}", entry.path.display(), entry.reason);
    }
}
