//! Laser wavelength resolution from scan filenames.
//!
//! The acquisition software embeds the OPO wavelength in each instrument
//! file name as `Laser_On_<N>nm`, where `<N>` is an integer or decimal
//! nanometer value. Files without the marker (laser-off backgrounds,
//! calibration scans) resolve to no wavelength and are excluded from the
//! action spectrum, but remain usable for raw dumps.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// The filename convention, as a single documented pattern.
///
/// Case-sensitive; the capture group is the wavelength in nanometers.
pub const LASER_ON_PATTERN: &str = r"Laser_On_(\d+(?:\.\d+)?)nm";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(LASER_ON_PATTERN).expect("pattern is valid"))
}

/// Extract the wavelength from a bare file name.
///
/// Returns `None` when the name does not follow the convention; that is a
/// valid state (laser-off scan), not an error.
pub fn from_name(name: &str) -> Option<f64> {
    pattern()
        .captures(name)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract the wavelength from a path's file name.
pub fn from_path(path: &Path) -> Option<f64> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(from_name)
}
