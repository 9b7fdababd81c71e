//! Mapmaker CLI - Command-line interface
//!
//! Turns game world screenshots into a leaflet tile pyramid:
//!
//! ```text
//! mapmaker ingest <screenshots> <tiles>     # LOD 0 from screenshots
//! mapmaker build <tiles>                    # LOD 1..=max from LOD 0
//! mapmaker composite <tiles> <map.jpg>      # one level as a single image
//! mapmaker config init <mapmaker.ini>       # write the settings in effect
//! ```

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use mapmaker::logging::{init_logging, LoggingConfig};
use tracing::debug;

use commands::build::BuildArgs;
use commands::composite::CompositeArgs;
use commands::config::ConfigCommands;
use commands::ingest::IngestArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "mapmaker")]
#[command(version = mapmaker::VERSION)]
#[command(about = "Build LOD tile pyramids from game world screenshots", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write the log to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// INI file with [pyramid] and [ingest] settings
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build LOD 1 up to the maximum level from existing LOD 0 tiles
    Build(BuildArgs),

    /// Create LOD 0 tiles from screenshots
    Ingest(IngestArgs),

    /// Stitch the tiles of one level into a single image
    Composite(CompositeArgs),

    /// Show or write the INI settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::new().with_verbose(cli.verbose);
    if let Some(path) = &cli.log_file {
        logging = logging.with_log_file(path);
    }
    let _guard = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", CliError::from(e));
            process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file = commands::common::load_config(cli.config.as_deref())?;
    debug!(config = ?cli.config, settings = ?file, "Resolved configuration");

    match cli.command {
        Commands::Build(args) => commands::build::run(args, &file),
        Commands::Ingest(args) => commands::ingest::run(args, &file),
        Commands::Composite(args) => commands::composite::run(args, &file),
        Commands::Config(command) => commands::config::run(command, &file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "mapmaker",
            "--verbose",
            "build",
            "tiles",
            "--max-lod",
            "3",
            "--background",
            "#102030",
            "-f",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.dir, PathBuf::from("tiles"));
        assert_eq!(args.max_lod, Some(3));
        assert_eq!(args.background, Some(image::Rgb([0x10, 0x20, 0x30])));
        assert!(args.force_overwrite);
    }

    #[test]
    fn test_parse_ingest_negative_overlap() {
        let cli = Cli::try_parse_from([
            "mapmaker", "ingest", "shots", "tiles", "--overlap", "-7", "--step", "100",
        ])
        .unwrap();

        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.overlap, Some(-7));
        assert_eq!(args.step, Some(100));
    }

    #[test]
    fn test_parse_composite_with_area() {
        let cli = Cli::try_parse_from([
            "mapmaker",
            "composite",
            "tiles",
            "map.jpg",
            "--lod",
            "2",
            "--min-x",
            "-4",
            "--min-z",
            "-4",
            "--max-x",
            "4",
            "--max-z",
            "4",
            "--config",
            "mapmaker.ini",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("mapmaker.ini")));
        let Commands::Composite(args) = cli.command else {
            panic!("expected composite");
        };
        assert_eq!(args.lod, 2);
        assert_eq!(args.min_x, Some(-4));
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from([
            "mapmaker", "--config", "base.ini", "config", "init", "new.ini", "--force",
        ])
        .unwrap();

        let Commands::Config(ConfigCommands::Init { path, force }) = cli.command else {
            panic!("expected config init");
        };
        assert_eq!(path, PathBuf::from("new.ini"));
        assert!(force);
    }

    #[test]
    fn test_parse_rejects_bad_color() {
        let result = Cli::try_parse_from(["mapmaker", "build", "tiles", "--background", "red"]);
        assert!(result.is_err());
    }
}
