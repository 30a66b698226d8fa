//! Reading converted mzML spectral files.
//!
//! The external converter turns proprietary instrument files into mzML; this
//! module reads those files back as streams of per-scan peak lists. Parsing
//! is pure: nothing here writes or mutates the input.

mod binary;
mod cv;
mod models;
mod streamer;

pub use binary::{decode_peak_array, BinaryDecodeError, PeakCompression, PeakEncoding};
pub use cv::{accessions, normalize_retention_time, CvParam};
pub use models::{MzMLFileMetadata, MzMLSpectrum};
pub use streamer::{MzMLStreamer, SpectrumIterator};

/// Errors raised while parsing an mzML file.
#[derive(Debug, thiserror::Error)]
pub enum MzMLError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary decode error: {0}")]
    Binary(#[from] BinaryDecodeError),

    #[error("invalid mzML structure: {0}")]
    InvalidStructure(String),

    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
