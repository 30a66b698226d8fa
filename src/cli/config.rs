//! TOML configuration file support.
//!
//! Recurring analyses can keep their settings in a file instead of a long
//! command line:
//!
//! ```toml
//! # uvpd.toml
//! [pipeline]
//! directory = "D:/SampleData/run3"
//! base_range = [239.0, 242.0]
//! fragment_ranges = [[54.5, 57.0], [95.0, 97.5]]
//! extract = false
//! normalize = true
//! power_file = "power_400_600_100us.csv"
//! print_raw_data = false
//! ```
//!
//! Command-line flags override values from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root structure of a `uvpd.toml` file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// The `[pipeline]` table.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineSection {
    /// Directory containing the instrument files.
    pub directory: Option<PathBuf>,

    /// Base-peak (parent ion) m/z range as `[lower, upper]`.
    pub base_range: Option<(f64, f64)>,

    /// Fragment ion m/z ranges, each `[lower, upper]`.
    #[serde(default)]
    pub fragment_ranges: Vec<(f64, f64)>,

    /// Convert instrument files before processing.
    pub extract: Option<bool>,

    /// Normalize efficiencies to laser power.
    pub normalize: Option<bool>,

    /// Power data CSV path.
    pub power_file: Option<PathBuf>,

    /// Dump each scan's full peak list to CSV.
    pub print_raw_data: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [pipeline]
            directory = "run3"
            base_range = [239.0, 242.0]
            fragment_ranges = [[54.5, 57.0], [95.0, 97.5]]
            extract = true
            normalize = true
            power_file = "power.csv"
            print_raw_data = false
        "#;

        let config = Config::from_toml(toml).unwrap();
        let p = config.pipeline;
        assert_eq!(p.directory, Some(PathBuf::from("run3")));
        assert_eq!(p.base_range, Some((239.0, 242.0)));
        assert_eq!(p.fragment_ranges, vec![(54.5, 57.0), (95.0, 97.5)]);
        assert_eq!(p.extract, Some(true));
        assert_eq!(p.normalize, Some(true));
        assert_eq!(p.power_file, Some(PathBuf::from("power.csv")));
        assert_eq!(p.print_raw_data, Some(false));
    }

    #[test]
    fn parse_partial_config() {
        let config = Config::from_toml("[pipeline]\nbase_range = [100.0, 110.0]\n").unwrap();
        assert_eq!(config.pipeline.base_range, Some((100.0, 110.0)));
        assert!(config.pipeline.fragment_ranges.is_empty());
        assert_eq!(config.pipeline.directory, None);
    }

    #[test]
    fn parse_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.pipeline.base_range, None);
    }
}
