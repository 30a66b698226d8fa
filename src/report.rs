//! Tabular output: the Result Series and optional raw spectrum dumps.
//!
//! One CSV per run summarizes every (wavelength, fragmentation channel)
//! pair; a second set of CSVs, written only on request, dumps each scan
//! file's full peak lists verbatim. Existing output files are never
//! overwritten: a numeric suffix is appended instead, as the acquisition
//! workstation keeps result files from consecutive runs side by side.

use std::path::{Path, PathBuf};

use crate::efficiency::Efficiency;
use crate::pipeline::Scan;
use crate::range::MassRange;

/// Base name of the Result Series file.
pub const RESULT_FILE_STEM: &str = "photofragmentation_efficiency";

/// Name of the subdirectory raw dumps are written to.
pub const RAW_DATA_SUBDIR: &str = "raw_data";

/// Errors raised while writing output files.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// The fragmentation channel a result row belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Channel {
    /// One user-supplied fragment ion range.
    Fragment(MassRange),
    /// All fragment ranges combined (sum of integrals over the base peak).
    Total,
}

/// Power-normalized efficiency state for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized {
    /// Raw efficiency divided by the measured laser power.
    Value(f64),
    /// The scan's wavelength has no usable entry in the power table.
    Unavailable,
}

/// One row of the Result Series.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Laser wavelength in nanometers.
    pub wavelength_nm: f64,
    /// Which fragmentation channel this row quantifies.
    pub channel: Channel,
    /// Raw efficiency, or undefined when the base integral was zero.
    pub raw: Efficiency,
    /// Normalized efficiency; `None` when normalization is disabled.
    pub normalized: Option<Normalized>,
    /// File the underlying scans came from, for traceability.
    pub source_file: String,
}

/// Find a path in `dir` that does not clobber an existing file.
pub fn unique_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}.{extension}"));
    let mut index = 0;
    while candidate.exists() {
        index += 1;
        candidate = dir.join(format!("{stem}_{index}.{extension}"));
    }
    candidate
}

/// Write the Result Series to `dir`, returning the file written.
pub fn write_result_series(dir: &Path, rows: &[ResultRow]) -> Result<PathBuf, ReportError> {
    let path = unique_output_path(dir, RESULT_FILE_STEM, "csv");
    let mut writer = csv::Writer::from_path(&path)?;

    writer.write_record([
        "wavelength_nm",
        "fragment_lower_mz",
        "fragment_upper_mz",
        "raw_efficiency",
        "raw_efficiency_stdev",
        "normalized_efficiency",
        "source_file",
    ])?;

    for row in rows {
        let (lower, upper) = match row.channel {
            Channel::Fragment(range) => (fmt_num(range.lower), fmt_num(range.upper)),
            Channel::Total => ("total".to_string(), "total".to_string()),
        };
        let (raw, raw_stdev) = match row.raw {
            Efficiency::Ratio { value, stdev } => (fmt_num(value), fmt_num(stdev)),
            Efficiency::Undefined => ("undefined".to_string(), String::new()),
        };
        let normalized = match (&row.raw, &row.normalized) {
            (_, None) => String::new(),
            (Efficiency::Undefined, Some(_)) => "undefined".to_string(),
            (_, Some(Normalized::Value(v))) => fmt_num(*v),
            (_, Some(Normalized::Unavailable)) => "unavailable".to_string(),
        };

        writer.write_record([
            fmt_num(row.wavelength_nm),
            lower,
            upper,
            raw,
            raw_stdev,
            normalized,
            row.source_file.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Dump the verbatim peak lists of one scan file's scans.
///
/// Writes `<stem>_raw.csv` into `dir` with one row per peak, keyed by the
/// scan's index within the file.
pub fn write_raw_dump(dir: &Path, stem: &str, scans: &[Scan]) -> Result<PathBuf, ReportError> {
    let path = unique_output_path(dir, &format!("{stem}_raw"), "csv");
    let mut writer = csv::Writer::from_path(&path)?;

    writer.write_record(["scan", "mz", "intensity"])?;
    for scan in scans {
        for (mz, intensity) in scan.mz.iter().zip(scan.intensity.iter()) {
            writer.write_record([
                scan.index.to_string(),
                fmt_num(*mz),
                fmt_num(*intensity),
            ])?;
        }
    }

    writer.flush()?;
    Ok(path)
}

/// Shortest round-trip decimal form; deterministic across runs.
fn fmt_num(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn anti_overwrite_suffixing() {
        let dir = tempdir().unwrap();
        let first = unique_output_path(dir.path(), RESULT_FILE_STEM, "csv");
        std::fs::write(&first, b"x").unwrap();
        let second = unique_output_path(dir.path(), RESULT_FILE_STEM, "csv");
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_1.csv"));
    }

    #[test]
    fn result_series_flags_degenerate_rows() {
        let dir = tempdir().unwrap();
        let rows = vec![
            ResultRow {
                wavelength_nm: 239.0,
                channel: Channel::Fragment(MassRange::new(54.5, 57.0)),
                raw: Efficiency::Ratio {
                    value: 0.25,
                    stdev: 0.0,
                },
                normalized: Some(Normalized::Value(0.125)),
                source_file: "Laser_On_239nm.mzML".to_string(),
            },
            ResultRow {
                wavelength_nm: 240.0,
                channel: Channel::Fragment(MassRange::new(54.5, 57.0)),
                raw: Efficiency::Undefined,
                normalized: Some(Normalized::Unavailable),
                source_file: "Laser_On_240nm.mzML".to_string(),
            },
        ];

        let path = write_result_series(dir.path(), &rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "239,54.5,57,0.25,0,0.125,Laser_On_239nm.mzML"
        );
        // degenerate base: raw flagged, normalized follows suit
        assert_eq!(lines[2], "240,54.5,57,undefined,,undefined,Laser_On_240nm.mzML");
    }

    #[test]
    fn raw_dump_is_verbatim() {
        let dir = tempdir().unwrap();
        let scans = vec![Scan {
            source_file: "Laser_On_239nm.mzML".to_string(),
            wavelength_nm: Some(239.0),
            index: 0,
            mz: vec![55.2, 240.1],
            intensity: vec![25.0, 100.0],
        }];

        let path = write_raw_dump(dir.path(), "Laser_On_239nm", &scans).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "scan,mz,intensity\n0,55.2,25\n0,240.1,100\n");
    }
}
