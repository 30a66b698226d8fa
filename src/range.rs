//! Mass ranges and ion-intensity integration.
//!
//! A [`MassRange`] is an inclusive closed interval on the m/z axis. The
//! integrator follows the domain's "total ion current in window" convention:
//! plain summation of every in-range intensity, no baseline subtraction, no
//! outlier handling.

use serde::{Deserialize, Serialize};

/// Inclusive closed interval `[lower, upper]` in m/z units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassRange {
    /// Lower bound, inclusive.
    pub lower: f64,
    /// Upper bound, inclusive.
    pub upper: f64,
}

impl MassRange {
    /// Build a range, normalizing swapped bounds.
    pub fn new(lower: f64, upper: f64) -> Self {
        if lower <= upper {
            Self { lower, upper }
        } else {
            Self {
                lower: upper,
                upper: lower,
            }
        }
    }

    /// Whether `mz` lies within the range, both endpoints included.
    pub fn contains(&self, mz: f64) -> bool {
        mz >= self.lower && mz <= self.upper
    }

    /// Whether two ranges share any m/z value.
    pub fn overlaps(&self, other: &MassRange) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

impl std::fmt::Display for MassRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Total ion intensity within `range`.
///
/// `mz` and `intensity` are parallel arrays as decoded from the mzML file.
/// Summation is order-independent, so no sortedness is assumed or required
/// of the input. Zero peaks in range yields 0.0, not an error.
pub fn integrate(mz: &[f64], intensity: &[f64], range: &MassRange) -> f64 {
    debug_assert_eq!(mz.len(), intensity.len());
    mz.iter()
        .zip(intensity.iter())
        .filter(|(m, _)| range.contains(**m))
        .map(|(_, i)| *i)
        .sum()
}
