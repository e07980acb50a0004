//! Pipeline configuration
//!
//! Every field defaults to the fixed values of the report: the UCI workbook
//! in the working directory, an 80/20 split seeded at 0, 60 trees of depth 15
//! seeded at 42, test instance 19, and an `assets` output directory.

use crate::error::{Result, XaiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Predictor columns, in model order
pub const FEATURE_COLUMNS: [&str; 4] = ["AT", "V", "AP", "RH"];

/// Target column (net hourly electrical energy output, MW)
pub const TARGET_COLUMN: &str = "PE";

/// Default input workbook
pub const DEFAULT_DATA_PATH: &str = "Folds5x2_pp.xlsx";

/// Default artifact directory served by the web layer
pub const DEFAULT_OUTPUT_DIR: &str = "assets";

/// Configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input spreadsheet
    pub data_path: PathBuf,
    /// Predictor column names
    pub feature_columns: Vec<String>,
    /// Target column name
    pub target_column: String,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed of the train/test shuffle
    pub split_seed: u64,
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Seed controlling bootstrap sampling and split feature order
    pub forest_seed: u64,
    /// Test-partition row explained by the local force plot
    pub instance_index: usize,
    /// Directory the artifacts are rendered into before publishing
    pub staging_dir: PathBuf,
    /// Directory the artifacts are published to
    pub output_dir: PathBuf,
    /// Raster scale applied when converting charts to PNG
    pub png_scale: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            feature_columns: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            target_column: TARGET_COLUMN.to_string(),
            test_size: 0.2,
            split_seed: 0,
            n_estimators: 60,
            max_depth: 15,
            forest_seed: 42,
            instance_index: 19,
            staging_dir: PathBuf::from("target/ccpp-stage"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            png_scale: 2.0,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with the fixed defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input spreadsheet
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the split seed
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Set the maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the forest seed
    pub fn with_forest_seed(mut self, seed: u64) -> Self {
        self.forest_seed = seed;
        self
    }

    /// Set the explained test row
    pub fn with_instance_index(mut self, index: usize) -> Self {
        self.instance_index = index;
        self
    }

    /// Set the staging directory
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_png_scale(mut self, scale: f32) -> Self {
        self.png_scale = scale;
        self
    }

    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(XaiError::ConfigError(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_estimators == 0 {
            return Err(XaiError::ConfigError("n_estimators must be positive".to_string()));
        }
        if self.max_depth == 0 {
            return Err(XaiError::ConfigError("max_depth must be positive".to_string()));
        }
        if self.feature_columns.is_empty() {
            return Err(XaiError::ConfigError("at least one feature column is required".to_string()));
        }
        if self.feature_columns.iter().any(|c| c == &self.target_column) {
            return Err(XaiError::ConfigError(format!(
                "target column {} is also listed as a feature",
                self.target_column
            )));
        }
        if !(self.png_scale > 0.0) {
            return Err(XaiError::ConfigError(format!(
                "png_scale must be positive, got {}",
                self.png_scale
            )));
        }
        Ok(())
    }
}
