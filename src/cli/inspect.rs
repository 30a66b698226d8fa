//! The `inspect` subcommand: summarize one mzML file scan by scan.

use anyhow::{Context, Result};
use std::path::PathBuf;

use uvpd::mzml::MzMLStreamer;
use uvpd::wavelength;

pub fn run(file: PathBuf) -> Result<()> {
    let mut streamer = MzMLStreamer::open(&file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    println!("File: {}", file.display());
    match wavelength::from_path(&file) {
        Some(nm) => println!("Wavelength: {nm} nm"),
        None => println!("Wavelength: none (file name carries no Laser_On_<N>nm marker)"),
    }

    let mut scans = 0usize;
    let mut peaks = 0usize;
    while let Some(spectrum) = streamer
        .next_spectrum()
        .with_context(|| format!("Failed to read {}", file.display()))?
    {
        scans += 1;
        peaks += spectrum.peak_count();
        let rt = spectrum
            .retention_time
            .map(|s| format!("{s:.2} s"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  scan {:>4}  MS{}  {:>7} peaks  rt {}  id '{}'",
            spectrum.scan_number().unwrap_or(spectrum.index + 1),
            spectrum.ms_level,
            spectrum.peak_count(),
            rt,
            spectrum.id
        );
    }

    let metadata = streamer.metadata();
    if let Some(run_id) = &metadata.run_id {
        println!("Run id: {run_id}");
    }
    if let Some(version) = &metadata.version {
        println!("mzML version: {version}");
    }
    println!("{scans} scan(s), {peaks} peak(s) total");

    Ok(())
}
