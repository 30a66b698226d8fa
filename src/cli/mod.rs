//! Command-line interface for the `uvpd` binary.

mod config;
mod inspect;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use run::RunArgs;

/// UVPD action-spectrum extraction from mass-spectrometry scan files.
#[derive(Parser, Debug)]
#[command(name = "uvpd", version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one acquisition directory into a result series CSV
    Run(RunArgs),

    /// Print a scan-by-scan summary of one mzML file
    Inspect {
        /// The mzML file to inspect
        file: PathBuf,
    },
}

/// Initialize logging from the `-v` count (default warnings only).
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Dispatch a parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Inspect { file } => inspect::run(file),
    }
}
