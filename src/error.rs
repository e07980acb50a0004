//! Error types for the CCPP explainability pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, XaiError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum XaiError {
    /// Input file is malformed or lacks a required column
    #[error("Data format error: {0}")]
    DataFormatError(String),

    /// Too few rows to build a train/test partition
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientDataError { required: usize, actual: usize },

    /// A single artifact could not be written or moved (non-fatal)
    #[error("Artifact write error for {path}: {reason}")]
    ArtifactWriteError { path: String, reason: String },

    #[error("Index {index} out of bounds for {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Plot error: {0}")]
    PlotError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl XaiError {
    /// Whether the pipeline must stop when this error surfaces
    pub fn is_fatal(&self) -> bool {
        !matches!(self, XaiError::ArtifactWriteError { .. } | XaiError::PlotError(_))
    }
}

impl From<polars::error::PolarsError> for XaiError {
    fn from(err: polars::error::PolarsError) -> Self {
        XaiError::DataFormatError(err.to_string())
    }
}

impl From<calamine::Error> for XaiError {
    fn from(err: calamine::Error) -> Self {
        XaiError::DataFormatError(err.to_string())
    }
}

impl From<serde_json::Error> for XaiError {
    fn from(err: serde_json::Error) -> Self {
        XaiError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for XaiError {
    fn from(err: ndarray::ShapeError) -> Self {
        XaiError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
