//! Controlled-vocabulary terms used by the streaming parser.
//!
//! mzML annotates everything through HUPO-PSI CV params. The pipeline only
//! needs a handful of accessions; they are collected here so the streamer
//! matches on named constants instead of string literals.

use quick_xml::events::BytesStart;

use super::streamer::get_attribute;
use super::MzMLError;

/// A single `<cvParam>` element.
#[derive(Debug, Clone, Default)]
pub struct CvParam {
    /// CV accession, e.g. `"MS:1000511"`.
    pub accession: String,
    /// Human-readable term name.
    pub name: String,
    /// Optional value attribute.
    pub value: Option<String>,
    /// Optional unit accession, e.g. `"UO:0000031"` for minutes.
    pub unit_accession: Option<String>,
}

impl CvParam {
    /// Parse a `<cvParam>` start/empty tag.
    pub fn from_event(e: &BytesStart) -> Result<Self, MzMLError> {
        Ok(CvParam {
            accession: get_attribute(e, "accession")?.unwrap_or_default(),
            name: get_attribute(e, "name")?.unwrap_or_default(),
            value: get_attribute(e, "value")?,
            unit_accession: get_attribute(e, "unitAccession")?,
        })
    }

    /// Value parsed as f64, if present and numeric.
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_deref().and_then(|v| v.trim().parse().ok())
    }

    /// Value parsed as i64, if present and numeric.
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

/// MS CV accessions the pipeline cares about.
pub mod accessions {
    /// ms level
    pub const MS_LEVEL: &str = "MS:1000511";
    /// centroid spectrum
    pub const CENTROID_SPECTRUM: &str = "MS:1000127";
    /// profile spectrum
    pub const PROFILE_SPECTRUM: &str = "MS:1000128";
    /// positive scan
    pub const POSITIVE_SCAN: &str = "MS:1000130";
    /// negative scan
    pub const NEGATIVE_SCAN: &str = "MS:1000129";
    /// total ion current
    pub const TOTAL_ION_CURRENT: &str = "MS:1000285";
    /// lowest observed m/z
    pub const LOWEST_OBSERVED_MZ: &str = "MS:1000528";
    /// highest observed m/z
    pub const HIGHEST_OBSERVED_MZ: &str = "MS:1000527";
    /// scan start time
    pub const SCAN_START_TIME: &str = "MS:1000016";
    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";
    /// intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";
    /// 32-bit float
    pub const FLOAT_32_BIT: &str = "MS:1000521";
    /// 64-bit float
    pub const FLOAT_64_BIT: &str = "MS:1000523";
    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";
    /// no compression
    pub const NO_COMPRESSION: &str = "MS:1000576";
    /// MS-Numpress linear prediction compression
    pub const NUMPRESS_LINEAR: &str = "MS:1002312";
    /// MS-Numpress positive integer compression
    pub const NUMPRESS_PIC: &str = "MS:1002313";
    /// MS-Numpress short logged float compression
    pub const NUMPRESS_SLOF: &str = "MS:1002314";
    /// unit: minute
    pub const UNIT_MINUTE: &str = "UO:0000031";
}

/// Normalize a scan start time to seconds based on its unit accession.
pub fn normalize_retention_time(value: f64, unit_accession: Option<&str>) -> f64 {
    match unit_accession {
        Some(accessions::UNIT_MINUTE) => value * 60.0,
        _ => value,
    }
}
