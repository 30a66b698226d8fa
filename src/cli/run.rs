//! The `run` subcommand: process one acquisition directory end to end.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use uvpd::convert::MsConvert;
use uvpd::pipeline::{run_pipeline_with, PipelineConfig};
use uvpd::range::MassRange;

use super::config::Config;

/// Arguments for `uvpd run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory containing the instrument files
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Base-peak (parent ion) m/z range
    #[arg(long, num_args = 2, value_names = ["LOWER", "UPPER"])]
    pub base: Option<Vec<f64>>,

    /// Fragment ion m/z range; repeat the flag for multiple channels
    #[arg(long = "fragment", num_args = 2, value_names = ["LOWER", "UPPER"], action = clap::ArgAction::Append)]
    pub fragment: Vec<f64>,

    /// Convert .wiff instrument files before processing
    #[arg(long)]
    pub extract: bool,

    /// Normalize efficiencies to measured laser power
    #[arg(long)]
    pub normalize: bool,

    /// Power data CSV (wavelength, power[, stdev]); required with --normalize
    #[arg(long, value_name = "FILE")]
    pub power_file: Option<PathBuf>,

    /// Also dump every scan's full peak list to raw_data/
    #[arg(long)]
    pub raw_data: bool,

    /// Read defaults from a TOML configuration file (flags win)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Converter executable to use instead of msconvert on PATH
    #[arg(long, value_name = "PROGRAM")]
    pub converter: Option<String>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let defaults = file_config.pipeline;

    let directory = args
        .dir
        .or(defaults.directory)
        .context("no input directory given; pass --dir or set pipeline.directory in the config file")?;

    let base_range = match args.base {
        Some(bounds) => MassRange::new(bounds[0], bounds[1]),
        None => {
            let (lower, upper) = defaults
                .base_range
                .context("no base-peak range given; pass --base or set pipeline.base_range")?;
            MassRange::new(lower, upper)
        }
    };

    let mut fragment_ranges: Vec<MassRange> = args
        .fragment
        .chunks(2)
        .map(|pair| MassRange::new(pair[0], pair[1]))
        .collect();
    if fragment_ranges.is_empty() {
        fragment_ranges = defaults
            .fragment_ranges
            .iter()
            .map(|&(lower, upper)| MassRange::new(lower, upper))
            .collect();
    }
    if fragment_ranges.is_empty() {
        bail!("at least one fragment ion range is required; pass --fragment or set pipeline.fragment_ranges");
    }

    let pipeline_config = PipelineConfig {
        directory,
        base_range,
        fragment_ranges,
        extract: args.extract || defaults.extract.unwrap_or(false),
        normalize: args.normalize || defaults.normalize.unwrap_or(false),
        power_file: args.power_file.or(defaults.power_file),
        print_raw_data: args.raw_data || defaults.print_raw_data.unwrap_or(false),
    };

    let converter = match args.converter {
        Some(program) => MsConvert::with_program(program),
        None => MsConvert::default(),
    };

    let summary = run_pipeline_with(&pipeline_config, &converter)?;

    println!(
        "Wrote {} result rows to {}",
        summary.rows,
        summary.output_path.display()
    );
    println!(
        "{} scan file(s) processed, {} raw dump(s) written",
        summary.files_processed, summary.raw_dumps
    );
    if !summary.files_skipped.is_empty() {
        println!("Skipped {} unreadable file(s):", summary.files_skipped.len());
        for path in &summary.files_skipped {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
