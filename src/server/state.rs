//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::pipeline::PipelineReport;

/// Application state shared across handlers; read-only once the server starts
pub struct AppState {
    pub report: Arc<PipelineReport>,
    /// Directory the published artifacts are served from
    pub assets_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(report: Arc<PipelineReport>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            report,
            assets_dir: assets_dir.into(),
            started_at: Utc::now(),
        }
    }
}
