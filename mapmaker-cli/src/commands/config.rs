//! `mapmaker config`: inspect and write the INI settings file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use mapmaker::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write the settings in effect to a new INI file
    Init {
        /// File to create
        path: PathBuf,

        /// Replace the file if it exists
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Print the settings in effect
    List,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, file: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { path, force } => run_init(&path, force, file),
        ConfigCommands::List => {
            print!("{}", file);
            Ok(())
        }
    }
}

fn run_init(path: &Path, force: bool, file: &ConfigFile) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::InvalidArguments(format!(
            "{} already exists, use --force to replace it",
            path.display()
        )));
    }
    file.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
