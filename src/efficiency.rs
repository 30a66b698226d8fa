//! Photofragmentation efficiency calculation.
//!
//! For one scan file, every mass range is integrated in each of its scans;
//! the per-scan integrals are then averaged so that a file acquired with N
//! repeat scans yields one integral (and its scan-to-scan scatter) per
//! range. Efficiency is the ratio of a fragment channel's integral to the
//! base-peak integral.
//!
//! Division by a zero base integral is degenerate data, not a number: it is
//! represented explicitly by [`Efficiency::Undefined`] and carried through
//! aggregation instead of leaking a NaN or a silent zero.

use crate::range::{integrate, MassRange};

/// Mean and scatter of a range integral across the scans of one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralStats {
    /// Mean of the per-scan integrals.
    pub mean: f64,
    /// Population standard deviation of the per-scan integrals.
    pub stdev: f64,
    /// Number of scans that contributed.
    pub scans: usize,
}

impl IntegralStats {
    /// Summarize one integral value per scan.
    pub fn from_scan_integrals(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                stdev: 0.0,
                scans: 0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            stdev: variance.sqrt(),
            scans: values.len(),
        }
    }

    /// Integrate `range` in every scan's peak list and summarize.
    pub fn integrate_scans<'a, I>(scans: I, range: &MassRange) -> Self
    where
        I: IntoIterator<Item = (&'a [f64], &'a [f64])>,
    {
        let integrals: Vec<f64> = scans
            .into_iter()
            .map(|(mz, intensity)| integrate(mz, intensity, range))
            .collect();
        Self::from_scan_integrals(&integrals)
    }
}

/// A fragmentation efficiency: a ratio, or explicitly undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Efficiency {
    /// `fragment / base` with the propagated scan-to-scan uncertainty.
    Ratio {
        /// The efficiency value.
        value: f64,
        /// Propagated standard deviation of the ratio.
        stdev: f64,
    },
    /// The base-peak integral was zero; no ratio exists for this scan file.
    Undefined,
}

impl Efficiency {
    /// The ratio value, if defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Efficiency::Ratio { value, .. } => Some(*value),
            Efficiency::Undefined => None,
        }
    }

    /// Whether the base integral was degenerate.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Efficiency::Undefined)
    }
}

/// Efficiency of one fragment channel against the base peak.
///
/// Uncertainty follows standard ratio propagation,
/// `d(F/B) = sqrt((dF/B)^2 + (F*dB/B^2)^2)`, which stays finite when the
/// fragment integral is zero.
pub fn efficiency(fragment: &IntegralStats, base: &IntegralStats) -> Efficiency {
    if base.mean == 0.0 {
        return Efficiency::Undefined;
    }
    let value = fragment.mean / base.mean;
    let stdev = ((fragment.stdev / base.mean).powi(2)
        + (fragment.mean * base.stdev / base.mean.powi(2)).powi(2))
    .sqrt();
    Efficiency::Ratio { value, stdev }
}

/// Combined efficiency of all fragment channels.
///
/// The total is the sum of the fragment integrals over the base integral
/// (not the sum of the per-channel ratios); fragment uncertainties combine
/// in quadrature before propagation.
pub fn total_efficiency(fragments: &[IntegralStats], base: &IntegralStats) -> Efficiency {
    let combined = IntegralStats {
        mean: fragments.iter().map(|f| f.mean).sum(),
        stdev: fragments
            .iter()
            .map(|f| f.stdev.powi(2))
            .sum::<f64>()
            .sqrt(),
        scans: base.scans,
    };
    efficiency(&combined, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean: f64, stdev: f64) -> IntegralStats {
        IntegralStats {
            mean,
            stdev,
            scans: 1,
        }
    }

    #[test]
    fn simple_ratio() {
        let eff = efficiency(&stats(25.0, 0.0), &stats(100.0, 0.0));
        assert_eq!(
            eff,
            Efficiency::Ratio {
                value: 0.25,
                stdev: 0.0
            }
        );
    }

    #[test]
    fn zero_base_is_undefined_not_zero() {
        let eff = efficiency(&stats(25.0, 1.0), &stats(0.0, 0.0));
        assert!(eff.is_undefined());
        assert_eq!(eff.value(), None);
    }

    #[test]
    fn zero_fragment_is_a_defined_zero() {
        let eff = efficiency(&stats(0.0, 0.0), &stats(100.0, 5.0));
        assert_eq!(eff.value(), Some(0.0));
    }

    #[test]
    fn ratio_uncertainty_propagates() {
        // F = 50 +/- 5, B = 100 +/- 10:
        // d = sqrt((5/100)^2 + (50*10/100^2)^2) = sqrt(0.0025 + 0.0025)
        let eff = efficiency(&stats(50.0, 5.0), &stats(100.0, 10.0));
        match eff {
            Efficiency::Ratio { value, stdev } => {
                assert!((value - 0.5).abs() < 1e-12);
                assert!((stdev - 0.005f64.sqrt()).abs() < 1e-12);
            }
            Efficiency::Undefined => panic!("expected a defined ratio"),
        }
    }

    #[test]
    fn total_sums_integrals_not_ratios() {
        let fragments = [stats(10.0, 3.0), stats(20.0, 4.0)];
        let base = stats(100.0, 0.0);
        match total_efficiency(&fragments, &base) {
            Efficiency::Ratio { value, stdev } => {
                assert!((value - 0.3).abs() < 1e-12);
                assert!((stdev - 0.05).abs() < 1e-12);
            }
            Efficiency::Undefined => panic!("expected a defined ratio"),
        }
    }

    #[test]
    fn integral_stats_across_scans() {
        let stats = IntegralStats::from_scan_integrals(&[90.0, 110.0]);
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.stdev, 10.0);
        assert_eq!(stats.scans, 2);
    }

    #[test]
    fn no_scans_yields_zero_integral() {
        let stats = IntegralStats::from_scan_integrals(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.scans, 0);
    }
}
