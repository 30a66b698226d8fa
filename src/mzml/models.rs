//! Data models for parsed mzML content.
//!
//! Only the subset of the mzML data model that the UVPD pipeline consumes is
//! represented here: per-scan peak arrays plus the scan-level metadata used
//! for reporting and diagnostics.

/// A single mass spectrum read from an mzML file.
///
/// The m/z array is written in ascending order by every converter we have
/// encountered, but the integrator downstream does not rely on it.
#[derive(Debug, Clone, Default)]
pub struct MzMLSpectrum {
    /// Spectrum index within the file (0-based).
    pub index: i64,

    /// Native spectrum ID from the file (e.g. `"scan=1"`).
    pub id: String,

    /// Declared array length (`defaultArrayLength` attribute).
    pub default_array_length: usize,

    /// MS level (1 for MS1, 2 for MS2, ...).
    pub ms_level: i16,

    /// Whether the spectrum is centroided (true) or profile (false).
    pub centroided: bool,

    /// Polarity: 1 positive, -1 negative, 0 unknown.
    pub polarity: i8,

    /// Retention time in seconds.
    pub retention_time: Option<f64>,

    /// Total ion current as reported by the instrument.
    pub total_ion_current: Option<f64>,

    /// Lowest observed m/z.
    pub lowest_mz: Option<f64>,

    /// Highest observed m/z.
    pub highest_mz: Option<f64>,

    /// Decoded m/z array.
    pub mz_array: Vec<f64>,

    /// Decoded intensity array, parallel to `mz_array`.
    pub intensity_array: Vec<f64>,
}

impl MzMLSpectrum {
    /// Number of peaks in the spectrum. Zero is valid: the instrument
    /// recorded no ions for this scan.
    pub fn peak_count(&self) -> usize {
        self.mz_array.len()
    }

    /// Extract the scan number from the native ID.
    ///
    /// Handles `"scan=12345"` (optionally prefixed with controller fields)
    /// and the bare `"S12345"` form, falling back to `index + 1`.
    pub fn scan_number(&self) -> Option<i64> {
        if let Some(pos) = self.id.find("scan=") {
            let start = pos + 5;
            let end = self.id[start..]
                .find(|c: char| !c.is_ascii_digit())
                .map(|i| start + i)
                .unwrap_or(self.id.len());
            self.id[start..end].parse().ok()
        } else if let Some(rest) = self.id.strip_prefix('S') {
            rest.parse().ok()
        } else {
            Some(self.index + 1)
        }
    }
}

/// File-level metadata gathered while skipping to the spectrum list.
#[derive(Debug, Clone, Default)]
pub struct MzMLFileMetadata {
    /// mzML schema version declared by the file.
    pub version: Option<String>,

    /// Run ID from the `<run>` element.
    pub run_id: Option<String>,

    /// Run start timestamp, verbatim from the file.
    pub run_start_time: Option<String>,
}
