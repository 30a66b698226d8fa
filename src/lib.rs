//! # uvpd - UVPD Action-Spectrum Extraction
//!
//! `uvpd` turns a directory of mass-spectrometry scan files from a
//! photofragmentation (UVPD) experiment into an action spectrum: for each
//! laser wavelength, the fragmentation efficiency of the parent ion into
//! one or more fragment channels, optionally normalized to the measured
//! laser power at that wavelength.
//!
//! ## Key Features
//!
//! - **Streaming mzML reader**: Pull-parses spectra one at a time with
//!   Base64/zlib peak-array decoding, so large acquisition files never
//!   need to fit in memory at once.
//!
//! - **Wavelength from file names**: Scan files follow the acquisition
//!   convention `Laser_On_<N>nm`; the wavelength is recovered from the
//!   name, and files without the marker (backgrounds, blanks) are read
//!   but excluded from the spectrum.
//!
//! - **Explicit degenerate results**: A zero base-peak integral yields an
//!   [`efficiency::Efficiency::Undefined`] result, never a silent zero;
//!   a wavelength missing from the power table yields a flagged
//!   unnormalized row, never a substituted value.
//!
//! - **Vendor-file conversion**: Proprietary instrument files are
//!   converted through an external converter (`msconvert`) behind the
//!   [`convert::FileConverter`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uvpd::pipeline::{run_pipeline, PipelineConfig};
//! use uvpd::range::MassRange;
//!
//! let config = PipelineConfig {
//!     directory: "run3".into(),
//!     base_range: MassRange::new(239.0, 242.0),
//!     fragment_ranges: vec![MassRange::new(54.5, 57.0)],
//!     extract: false,
//!     normalize: false,
//!     power_file: None,
//!     print_raw_data: false,
//! };
//!
//! let summary = run_pipeline(&config)?;
//! println!(
//!     "{} rows -> {}",
//!     summary.rows,
//!     summary.output_path.display()
//! );
//! # Ok::<(), uvpd::pipeline::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`mzml`]: streaming mzML parser (spectra, CV params, binary arrays)
//! - [`convert`]: external instrument-file conversion
//! - [`wavelength`]: laser wavelength recovery from file names
//! - [`range`]: inclusive m/z windows and intensity integration
//! - [`efficiency`]: per-file integral statistics and efficiency ratios
//! - [`power`]: wavelength-indexed laser power table
//! - [`pipeline`]: the end-to-end run over one directory
//! - [`report`]: result-series CSV and raw peak dumps

pub mod convert;
pub mod efficiency;
pub mod mzml;
pub mod pipeline;
pub mod power;
pub mod range;
pub mod report;
pub mod wavelength;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::convert::{ConvertError, FileConverter, MsConvert};
    pub use crate::efficiency::{efficiency, total_efficiency, Efficiency, IntegralStats};
    pub use crate::mzml::{MzMLError, MzMLSpectrum, MzMLStreamer};
    pub use crate::pipeline::{
        run_pipeline, run_pipeline_with, PipelineConfig, PipelineError, RunSummary, Scan,
    };
    pub use crate::power::{PowerEntry, PowerTable, PowerTableError};
    pub use crate::range::{integrate, MassRange};
    pub use crate::report::{Channel, Normalized, ResultRow};
}
