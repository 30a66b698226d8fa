//! Binary data decoding for mzML peak arrays.
//!
//! mzML stores the m/z and intensity arrays as Base64 text, optionally zlib
//! compressed, holding little-endian 32- or 64-bit floats. The decode
//! pipeline is: Base64 -> (decompress) -> floats.

use std::io::Read;

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use super::cv::accessions;

/// Compression applied to a binary data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakCompression {
    /// Raw binary, no compression.
    #[default]
    None,
    /// zlib (the common case for msconvert output).
    Zlib,
    /// Any of the MS-Numpress schemes. Not produced by the converters this
    /// pipeline fronts; decoding it is refused rather than guessed at.
    Numpress,
}

impl PeakCompression {
    /// Map a CV accession onto a compression type.
    pub fn from_accession(accession: &str) -> Option<Self> {
        match accession {
            accessions::NO_COMPRESSION => Some(PeakCompression::None),
            accessions::ZLIB_COMPRESSION => Some(PeakCompression::Zlib),
            accessions::NUMPRESS_LINEAR
            | accessions::NUMPRESS_PIC
            | accessions::NUMPRESS_SLOF => Some(PeakCompression::Numpress),
            _ => None,
        }
    }
}

/// Floating-point width of a binary data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakEncoding {
    /// 32-bit floats (MS:1000521).
    Float32,
    /// 64-bit floats (MS:1000523).
    #[default]
    Float64,
}

impl PeakEncoding {
    /// Map a CV accession onto an encoding.
    pub fn from_accession(accession: &str) -> Option<Self> {
        match accession {
            accessions::FLOAT_32_BIT => Some(PeakEncoding::Float32),
            accessions::FLOAT_64_BIT => Some(PeakEncoding::Float64),
            _ => None,
        }
    }

    fn byte_size(self) -> usize {
        match self {
            PeakEncoding::Float32 => 4,
            PeakEncoding::Float64 => 8,
        }
    }
}

/// Errors raised while decoding a binary data array.
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decompression error: {0}")]
    Decompression(#[from] std::io::Error),

    #[error("binary payload of {actual} bytes is not a whole number of {width}-byte values")]
    MisalignedPayload { actual: usize, width: usize },

    #[error("decoded {actual} values but the spectrum declared {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("MS-Numpress compression is not supported")]
    UnsupportedCompression,
}

/// Decode one Base64-encoded binary array into f64 values.
///
/// `expected_length` comes from the spectrum's `defaultArrayLength` and is
/// checked when present; a mismatch means the file is internally
/// inconsistent.
pub fn decode_peak_array(
    base64_data: &str,
    encoding: PeakEncoding,
    compression: PeakCompression,
    expected_length: Option<usize>,
) -> Result<Vec<f64>, BinaryDecodeError> {
    let trimmed = base64_data.trim();
    if trimmed.is_empty() {
        // An empty <binary> element is a scan with no recorded ions.
        return Ok(Vec::new());
    }

    let decoded = BASE64_STANDARD.decode(trimmed)?;

    let raw = match compression {
        PeakCompression::None => decoded,
        PeakCompression::Zlib => {
            let mut decoder = ZlibDecoder::new(&decoded[..]);
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf)?;
            buf
        }
        PeakCompression::Numpress => {
            return Err(BinaryDecodeError::UnsupportedCompression);
        }
    };

    let values = bytes_to_floats(&raw, encoding)?;

    if let Some(expected) = expected_length {
        if values.len() != expected {
            return Err(BinaryDecodeError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
    }

    Ok(values)
}

fn bytes_to_floats(bytes: &[u8], encoding: PeakEncoding) -> Result<Vec<f64>, BinaryDecodeError> {
    let width = encoding.byte_size();
    if bytes.len() % width != 0 {
        return Err(BinaryDecodeError::MisalignedPayload {
            actual: bytes.len(),
            width,
        });
    }

    let count = bytes.len() / width;
    let mut values = Vec::with_capacity(count);
    let mut cursor = std::io::Cursor::new(bytes);

    match encoding {
        PeakEncoding::Float32 => {
            for _ in 0..count {
                values.push(cursor.read_f32::<LittleEndian>()? as f64);
            }
        }
        PeakEncoding::Float64 => {
            for _ in 0..count {
                values.push(cursor.read_f64::<LittleEndian>()?);
            }
        }
    }

    Ok(values)
}
