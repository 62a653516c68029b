//! Run configuration.
//!
//! Loaded from an optional YAML file. Every field has a default, so an
//! empty file (or no file at all) reproduces the stock validation run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("confidence must be in (0, 1), got {0}")]
    Confidence(f64),

    #[error("histogram_edges must be at least 2, got {0}")]
    HistogramEdges(usize),

    #[error("band epsilon must be non-negative, got {0}")]
    Epsilon(f64),
}

/// Output image format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Input file names, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    /// Final per-governorate counts for the baseline scenario.
    pub final_results: String,
    /// Final per-governorate counts for the comparison scenario.
    pub final_results_comparison: String,
    /// Per-run infected counts over time.
    pub time_series: String,
    /// Observed `(timestamp, infected)` pairs.
    pub observed_series: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            final_results: "simResultsUnscaled.csv".to_string(),
            final_results_comparison: "simResultsUnscaledDoubled.csv".to_string(),
            time_series: "simResultsTime.csv".to_string(),
            observed_series: "realResultsTimes.csv".to_string(),
        }
    }
}

/// Legend labels for the two final-state scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioLabels {
    pub baseline: String,
    pub comparison: String,
}

impl Default for ScenarioLabels {
    fn default() -> Self {
        Self {
            baseline: "R0 = 3.05".to_string(),
            comparison: "R0 = 3.06".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Directory holding the simulation CSVs.
    pub data_dir: PathBuf,
    /// Directory figures are written to.
    pub output_dir: PathBuf,
    pub inputs: InputFiles,
    pub scenarios: ScenarioLabels,
    /// Number of histogram bin edges (bins = edges - 1).
    pub histogram_edges: usize,
    /// Confidence level for bar-chart error bars.
    pub confidence: f64,
    /// Relative bands around the observed fraction to count runs in.
    pub band_epsilons: Vec<f64>,
    pub image_format: ImageFormat,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("figures"),
            inputs: InputFiles::default(),
            scenarios: ScenarioLabels::default(),
            histogram_edges: 50,
            confidence: 0.95,
            band_epsilons: vec![0.1, 0.5],
            image_format: ImageFormat::default(),
        }
    }
}

impl ValidationConfig {
    /// Parses configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Rejects values the routines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::Confidence(self.confidence));
        }
        if self.histogram_edges < 2 {
            return Err(ConfigError::HistogramEdges(self.histogram_edges));
        }
        if let Some(&eps) = self.band_epsilons.iter().find(|e| e.is_nan() || **e < 0.0) {
            return Err(ConfigError::Epsilon(eps));
        }
        Ok(())
    }

    /// Resolves an input file name against `data_dir`.
    pub fn input(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Output path for a figure with the given stem.
    pub fn figure(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", self.image_format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        let config = ValidationConfig::from_yaml("").unwrap();
        assert_eq!(config, ValidationConfig::default());
        assert_eq!(config.histogram_edges, 50);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
data_dir: "/data/run7"
image_format: svg
inputs:
  time_series: "timeseries.csv"
"#;
        let config = ValidationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/run7"));
        assert_eq!(config.inputs.time_series, "timeseries.csv");
        assert_eq!(config.inputs.final_results, "simResultsUnscaled.csv");
        assert_eq!(config.figure("bars"), PathBuf::from("figures/bars.svg"));
    }

    #[test]
    fn rejects_bad_confidence() {
        let err = ValidationConfig::from_yaml("confidence: 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Confidence(_)));
    }

    #[test]
    fn rejects_negative_epsilon() {
        let err = ValidationConfig::from_yaml("band_epsilons: [0.1, -0.2]").unwrap_err();
        assert!(matches!(err, ConfigError::Epsilon(_)));
    }
}
