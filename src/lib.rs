//! CCPP XAI - Explainability report for a combined cycle power plant model
//!
//! This crate fits a Random Forest regressor to the combined cycle power
//! plant measurements and explains it with exact TreeSHAP values:
//! - Dataset loading and schema validation
//! - Seeded train/test split and standard scaling
//! - Random Forest regression with R² scoring
//! - TreeSHAP attributions, global importance and local explanations
//! - Summary, dependence and force plots published to an output directory
//! - A small web layer serving the report
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Workbook and CSV loading
//! - [`preprocessing`] - Train/test split and scaling
//! - [`training`] - Decision trees, Random Forest, metrics
//! - [`explainability`] - TreeSHAP and local explanations
//!
//! ## Reporting
//! - [`visualization`] - SVG charts, PNG rasterization, HTML force plot
//! - [`pipeline`] - End-to-end run and artifact publishing
//!
//! ## Services
//! - [`server`] - HTTP dashboard and JSON report
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod explainability;

// Reporting
pub mod visualization;
pub mod pipeline;

// Services
pub mod server;
pub mod cli;

pub use error::{Result, XaiError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, XaiError};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Data
    pub use crate::data::{DatasetLoader, ObservationTable};

    // Preprocessing
    pub use crate::preprocessing::{train_test_split, StandardScaler, TrainTestSplit};

    // Training
    pub use crate::training::{r2_score, RandomForest, RegressionMetrics};

    // Explainability
    pub use crate::explainability::{LocalExplanation, ShapValues, TreeExplainer};

    // Pipeline
    pub use crate::pipeline::{PipelineReport, XaiPipeline};
}
