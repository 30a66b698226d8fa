//! Wavelength-indexed laser power measurements.
//!
//! Action spectra are reported as efficiency per unit laser power, so each
//! wavelength's raw efficiency is divided by the measured power at that
//! wavelength. The measurements come from a small CSV supplied by the user:
//! `wavelength_nm, power[, power_stdev]`. A scan whose wavelength has no
//! entry cannot be normalized; it is reported raw and flagged, never
//! silently substituted.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::warn;

/// One row of the power data file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerEntry {
    /// Laser wavelength in nanometers.
    pub wavelength_nm: f64,
    /// Measured laser power.
    pub power: f64,
    /// Standard deviation of the power measurement (0 when the file has
    /// only two columns). Recorded for provenance; the result series
    /// reports the scan-to-scan ratio stdev only, so this term does not
    /// enter the normalized value.
    pub power_stdev: f64,
}

/// Errors raised while loading a power data file.
#[derive(Debug, thiserror::Error)]
pub enum PowerTableError {
    #[error("failed to read power data file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse power data file: {0}")]
    Csv(#[from] csv::Error),

    #[error("power data row {row} must hold 2 or 3 numeric values (wavelength, power[, stdev]), got '{content}'")]
    BadRow { row: usize, content: String },

    #[error("power data file '{path}' contains no entries")]
    Empty { path: String },
}

/// Immutable mapping from wavelength to measured laser power.
///
/// Lookup is by exact wavelength; keys are stored at millinanometer
/// resolution so a `450` parsed from a filename matches a `450.0` row.
#[derive(Debug, Clone, Default)]
pub struct PowerTable {
    entries: HashMap<i64, PowerEntry>,
}

fn key(wavelength_nm: f64) -> i64 {
    (wavelength_nm * 1000.0).round() as i64
}

impl PowerTable {
    /// Load a power table from a CSV file.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, PowerTableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PowerTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file))?;
        if table.is_empty() {
            return Err(PowerTableError::Empty {
                path: path.display().to_string(),
            });
        }
        Ok(table)
    }

    /// Parse power data from any reader.
    ///
    /// A single leading non-numeric row is tolerated as a header; any other
    /// unparsable row is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PowerTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            match parse_row(&record) {
                Some(entry) => {
                    if entries.insert(key(entry.wavelength_nm), entry).is_some() {
                        warn!(
                            "duplicate power entry for {} nm; keeping the last one",
                            entry.wavelength_nm
                        );
                    }
                }
                None if row == 0 => {} // header row
                None => {
                    return Err(PowerTableError::BadRow {
                        row: row + 1,
                        content: record.iter().collect::<Vec<_>>().join(","),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// Build a table directly from entries (used by tests and embedding).
    pub fn from_entries<I: IntoIterator<Item = PowerEntry>>(entries: I) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (key(e.wavelength_nm), e)).collect(),
        }
    }

    /// Measured power at a wavelength, if the table has an entry for it.
    pub fn lookup(&self, wavelength_nm: f64) -> Option<&PowerEntry> {
        self.entries.get(&key(wavelength_nm))
    }

    /// Divide a raw efficiency by the measured power at `wavelength_nm`.
    ///
    /// Returns `None` when the wavelength is absent from the table or the
    /// recorded power is zero (a zero power cannot rescale anything).
    pub fn normalize(&self, wavelength_nm: f64, raw: f64) -> Option<f64> {
        match self.lookup(wavelength_nm) {
            Some(entry) if entry.power != 0.0 => Some(raw / entry.power),
            Some(entry) => {
                warn!(
                    "power at {} nm is recorded as {}; normalization skipped",
                    wavelength_nm, entry.power
                );
                None
            }
            None => None,
        }
    }

    /// Number of wavelengths in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<PowerEntry> {
    let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
    if fields.len() < 2 || fields.len() > 3 {
        return None;
    }
    let wavelength_nm: f64 = fields[0].parse().ok()?;
    let power: f64 = fields[1].parse().ok()?;
    let power_stdev: f64 = match fields.get(2) {
        Some(f) => f.parse().ok()?,
        None => 0.0,
    };
    Some(PowerEntry {
        wavelength_nm,
        power,
        power_stdev,
    })
}
