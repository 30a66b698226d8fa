//! The UVPD action-spectrum pipeline.
//!
//! One run processes one directory to completion: convert (or locate)
//! the mzML files, read each file's scans, integrate the base-peak and
//! fragment ranges, compute efficiencies, normalize against laser power,
//! and emit the Result Series. The loop is single-threaded; scan files
//! number in the tens to low hundreds and the expensive step (vendor-file
//! conversion) runs in an external process per file.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::convert::{ConvertError, FileConverter, MsConvert};
use crate::efficiency::{efficiency, total_efficiency, Efficiency, IntegralStats};
use crate::mzml::{MzMLError, MzMLStreamer};
use crate::power::{PowerTable, PowerTableError};
use crate::range::MassRange;
use crate::report::{self, Channel, Normalized, ReportError, ResultRow};
use crate::wavelength;

/// Conventional subdirectory holding converted mzML files.
pub const MZML_SUBDIR: &str = "mzml_directory";

/// Immutable configuration for one pipeline run.
///
/// Constructed by the caller (CLI or embedding code) and passed in whole;
/// the pipeline holds no other state between runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory containing the instrument files (and the mzML
    /// subdirectory).
    pub directory: PathBuf,
    /// m/z window of the parent ion.
    pub base_range: MassRange,
    /// m/z windows of the monitored fragment ions.
    pub fragment_ranges: Vec<MassRange>,
    /// Convert instrument files first (true) or reuse pre-converted mzML
    /// files from the conventional subdirectory (false).
    pub extract: bool,
    /// Normalize efficiencies to measured laser power.
    pub normalize: bool,
    /// Power data CSV; required when `normalize` is set.
    pub power_file: Option<PathBuf>,
    /// Also dump every scan's full peak list as CSV.
    pub print_raw_data: bool,
}

/// Errors that abort a pipeline run.
///
/// Per-file parse failures do not appear here as run failures: they are
/// isolated, logged, and collected in [`RunSummary::files_skipped`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: MzMLError,
    },

    #[error("no file in '{dir}' follows the Laser_On_<N>nm naming convention; no action spectrum can be built from this directory")]
    NamingConvention { dir: String },

    #[error("no converted mzML files found in '{dir}'; run with extraction enabled or convert the instrument files first")]
    MissingInput { dir: String },

    #[error("no instrument files to extract in '{dir}'")]
    NoInstrumentFiles { dir: String },

    #[error("normalization requested but no power data file was supplied")]
    MissingPowerFile,

    #[error(transparent)]
    Power(#[from] PowerTableError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One scan read from an mzML file, labeled with its provenance.
#[derive(Debug, Clone)]
pub struct Scan {
    /// File name (not full path) the scan came from.
    pub source_file: String,
    /// Wavelength resolved from the file name, if any.
    pub wavelength_nm: Option<f64>,
    /// Scan index within the file.
    pub index: i64,
    /// m/z values.
    pub mz: Vec<f64>,
    /// Intensities, parallel to `mz`.
    pub intensity: Vec<f64>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Path of the Result Series CSV written.
    pub output_path: PathBuf,
    /// Rows in the Result Series.
    pub rows: usize,
    /// Scan files read successfully.
    pub files_processed: usize,
    /// Scan files skipped because they failed to parse.
    pub files_skipped: Vec<PathBuf>,
    /// Raw-dump files written.
    pub raw_dumps: usize,
}

/// Run the pipeline with the default external converter (`msconvert`).
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    run_pipeline_with(config, &MsConvert::default())
}

/// Run the pipeline with a caller-supplied converter.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    converter: &dyn FileConverter,
) -> Result<RunSummary, PipelineError> {
    warn_on_overlapping_ranges(config);

    let power_table = if config.normalize {
        let path = config
            .power_file
            .as_deref()
            .ok_or(PipelineError::MissingPowerFile)?;
        let table = PowerTable::from_csv_file(path)?;
        info!("loaded {} power entries from {}", table.len(), path.display());
        Some(table)
    } else {
        None
    };

    let mzml_dir = config.directory.join(MZML_SUBDIR);

    if config.extract {
        extract_instrument_files(config, converter, &mzml_dir)?;
    }

    let mzml_files = files_with_extension(&mzml_dir, "mzml").map_err(|_| {
        PipelineError::MissingInput {
            dir: mzml_dir.display().to_string(),
        }
    })?;
    if mzml_files.is_empty() {
        return Err(PipelineError::MissingInput {
            dir: mzml_dir.display().to_string(),
        });
    }

    // Directory-level sanity check before any file is processed: a run in
    // which nothing resolves to a wavelength cannot produce a spectrum.
    if !mzml_files.iter().any(|p| wavelength::from_path(p).is_some()) {
        return Err(PipelineError::NamingConvention {
            dir: mzml_dir.display().to_string(),
        });
    }

    let raw_dir = config.directory.join(report::RAW_DATA_SUBDIR);
    if config.print_raw_data {
        fs::create_dir_all(&raw_dir)?;
    }

    let mut rows: Vec<ResultRow> = Vec::new();
    let mut files_skipped = Vec::new();
    let mut files_processed = 0usize;
    let mut raw_dumps = 0usize;

    for path in &mzml_files {
        let scans = match read_scans(path) {
            Ok(scans) => scans,
            Err(e) => {
                // Isolated failure: the run continues, the summary records
                // the omission.
                warn!("{e}");
                files_skipped.push(path.clone());
                continue;
            }
        };
        files_processed += 1;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if config.print_raw_data {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            report::write_raw_dump(&raw_dir, &stem, &scans)?;
            raw_dumps += 1;
        }

        let Some(wavelength_nm) = wavelength::from_path(path) else {
            info!("'{file_name}' carries no wavelength marker; excluded from the result series");
            continue;
        };
        debug!(
            "'{file_name}': {} scan(s) at {wavelength_nm} nm",
            scans.len()
        );

        let peaks: Vec<(&[f64], &[f64])> = scans
            .iter()
            .map(|s| (s.mz.as_slice(), s.intensity.as_slice()))
            .collect();

        let base = IntegralStats::integrate_scans(peaks.iter().copied(), &config.base_range);
        if base.mean == 0.0 {
            warn!("base-peak integral is zero in '{file_name}'; efficiencies are undefined for this file");
        }

        let fragment_stats: Vec<IntegralStats> = config
            .fragment_ranges
            .iter()
            .map(|range| IntegralStats::integrate_scans(peaks.iter().copied(), range))
            .collect();

        for (range, stats) in config.fragment_ranges.iter().zip(&fragment_stats) {
            let raw = efficiency(stats, &base);
            rows.push(build_row(
                wavelength_nm,
                Channel::Fragment(*range),
                raw,
                power_table.as_ref(),
                &file_name,
            ));
        }

        let total = total_efficiency(&fragment_stats, &base);
        rows.push(build_row(
            wavelength_nm,
            Channel::Total,
            total,
            power_table.as_ref(),
            &file_name,
        ));
    }

    // Deterministic emission order: ascending wavelength, ties broken by
    // file name; the stable sort keeps each file's channels in config
    // order with the total row last.
    rows.sort_by(|a, b| {
        a.wavelength_nm
            .partial_cmp(&b.wavelength_nm)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source_file.cmp(&b.source_file))
    });

    let output_path = report::write_result_series(&config.directory, &rows)?;
    info!(
        "wrote {} result rows to {} ({} file(s) processed, {} skipped)",
        rows.len(),
        output_path.display(),
        files_processed,
        files_skipped.len()
    );

    Ok(RunSummary {
        output_path,
        rows: rows.len(),
        files_processed,
        files_skipped,
        raw_dumps,
    })
}

/// Read every scan of one mzML file.
pub fn read_scans(path: &Path) -> Result<Vec<Scan>, PipelineError> {
    let wrap = |source: MzMLError| PipelineError::Parse {
        path: path.display().to_string(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let wavelength_nm = wavelength::from_path(path);

    let streamer = MzMLStreamer::open(path).map_err(wrap)?;
    let mut scans = Vec::new();
    for spectrum in streamer.spectra() {
        let spectrum = spectrum.map_err(wrap)?;
        scans.push(Scan {
            source_file: file_name.clone(),
            wavelength_nm,
            index: spectrum.index,
            mz: spectrum.mz_array,
            intensity: spectrum.intensity_array,
        });
    }
    Ok(scans)
}

fn build_row(
    wavelength_nm: f64,
    channel: Channel,
    raw: Efficiency,
    power_table: Option<&PowerTable>,
    source_file: &str,
) -> ResultRow {
    let normalized = power_table.map(|table| match raw.value() {
        Some(value) => table
            .normalize(wavelength_nm, value)
            .map(Normalized::Value)
            .unwrap_or(Normalized::Unavailable),
        None => Normalized::Unavailable,
    });

    ResultRow {
        wavelength_nm,
        channel,
        raw,
        normalized,
        source_file: source_file.to_string(),
    }
}

fn extract_instrument_files(
    config: &PipelineConfig,
    converter: &dyn FileConverter,
    mzml_dir: &Path,
) -> Result<(), PipelineError> {
    let instrument_files = files_with_extension(&config.directory, "wiff")?;
    if instrument_files.is_empty() {
        return Err(PipelineError::NoInstrumentFiles {
            dir: config.directory.display().to_string(),
        });
    }

    fs::create_dir_all(mzml_dir)?;
    for input in &instrument_files {
        // Conversion failures are per-file: log and carry on; the
        // missing-input check below catches the nothing-converted case.
        if let Err(e) = converter.convert(input, mzml_dir) {
            warn!("conversion failed, skipping '{}': {e}", input.display());
        }
    }
    Ok(())
}

/// Files in `dir` with the given extension (case-insensitive), sorted by
/// file name so enumeration order never depends on the filesystem.
fn files_with_extension(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort_by_key(|p| p.file_name().map(|n| n.to_owned()));
    Ok(files)
}

fn warn_on_overlapping_ranges(config: &PipelineConfig) {
    for (i, range) in config.fragment_ranges.iter().enumerate() {
        if range.overlaps(&config.base_range) {
            warn!("fragment range {range} overlaps the base-peak range {}", config.base_range);
        }
        for other in &config.fragment_ranges[i + 1..] {
            if range.overlaps(other) {
                warn!("fragment ranges {range} and {other} overlap");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::PowerEntry;

    #[test]
    fn files_sorted_by_name_not_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Laser_On_250nm.mzML", "Laser_On_239nm.mzml", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = files_with_extension(dir.path(), "mzml").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Laser_On_239nm.mzml", "Laser_On_250nm.mzML"]);
    }

    #[test]
    fn row_normalization_states() {
        let table = PowerTable::from_entries([PowerEntry {
            wavelength_nm: 450.0,
            power: 2.0,
            power_stdev: 0.0,
        }]);
        let raw = Efficiency::Ratio {
            value: 1.0,
            stdev: 0.0,
        };

        let row = build_row(450.0, Channel::Total, raw, Some(&table), "a.mzML");
        assert_eq!(row.normalized, Some(Normalized::Value(0.5)));

        // absent wavelength: raw value retained, row flagged
        let row = build_row(470.0, Channel::Total, raw, Some(&table), "a.mzML");
        assert_eq!(row.normalized, Some(Normalized::Unavailable));
        assert_eq!(row.raw.value(), Some(1.0));

        // normalization disabled: component bypassed entirely
        let row = build_row(450.0, Channel::Total, raw, None, "a.mzML");
        assert_eq!(row.normalized, None);
    }
}
