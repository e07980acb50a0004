//! Report artifacts and their publication into the output directory

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::XaiError;

/// One file produced by a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Artifact {
    /// Beeswarm of all SHAP values
    SummaryPlot,
    /// Mean |SHAP| bars
    DetailedSummaryPlot,
    /// Dependence plot of one feature
    DependencePlot(String),
    /// HTML explanation of the selected instance
    ForcePlot,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        match self {
            Artifact::SummaryPlot => "summary_plot.png".to_string(),
            Artifact::DetailedSummaryPlot => "detailed_summary_plot.png".to_string(),
            Artifact::DependencePlot(feature) => format!("dependence_plot_{}.png", feature),
            Artifact::ForcePlot => "force_plot_instance.html".to_string(),
        }
    }

    /// Every artifact of a run over `feature_names`, in publication order
    pub fn all(feature_names: &[String]) -> Vec<Artifact> {
        let mut artifacts = vec![Artifact::SummaryPlot, Artifact::DetailedSummaryPlot];
        artifacts.extend(feature_names.iter().cloned().map(Artifact::DependencePlot));
        artifacts.push(Artifact::ForcePlot);
        artifacts
    }
}

/// Outcome of rendering one artifact into the staging directory
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    pub artifact: Artifact,
    /// Staged file, or the reason rendering failed
    pub staged: std::result::Result<PathBuf, String>,
}

/// Per-file publication result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEntry {
    pub file_name: String,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub status: PublishStatus,
}

impl PublishEntry {
    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }
}

/// Explicit success/failure list for every expected artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub output_dir: PathBuf,
    pub entries: Vec<PublishEntry>,
}

impl PublishReport {
    pub fn published(&self) -> impl Iterator<Item = &PublishEntry> {
        self.entries.iter().filter(|e| e.is_published())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PublishEntry> {
        self.entries.iter().filter(|e| !e.is_published())
    }

    pub fn all_published(&self) -> bool {
        self.entries.iter().all(PublishEntry::is_published)
    }

    /// Destinations of the files that reached the output directory
    pub fn published_paths(&self) -> Vec<PathBuf> {
        self.published().map(|e| e.destination.clone()).collect()
    }
}

/// Move every staged artifact into `output_dir`.
///
/// Each file is handled on its own: a render failure, a missing staged file
/// or a failed move is recorded against that file and the rest continue.
pub fn publish(staged: &[StagedArtifact], output_dir: &Path) -> PublishReport {
    let dir_error = fs::create_dir_all(output_dir).err().map(|e| e.to_string());
    if let Some(reason) = &dir_error {
        warn!(output_dir = %output_dir.display(), error = %reason, "Cannot create output directory");
    }

    let entries = staged
        .iter()
        .map(|item| {
            let file_name = item.artifact.file_name();
            let destination = output_dir.join(&file_name);

            let outcome = match (&dir_error, &item.staged) {
                (Some(reason), _) => Err(format!("output directory unavailable: {}", reason)),
                (None, Err(reason)) => Err(format!("not rendered: {}", reason)),
                (None, Ok(source)) => move_file(source, &destination),
            };

            let status = match outcome {
                Ok(()) => {
                    info!(file = %file_name, destination = %destination.display(), "Artifact published");
                    PublishStatus::Published
                }
                Err(reason) => {
                    let err = XaiError::ArtifactWriteError {
                        path: destination.display().to_string(),
                        reason: reason.clone(),
                    };
                    warn!(file = %file_name, error = %err, "Artifact skipped");
                    PublishStatus::Failed { reason }
                }
            };

            PublishEntry { file_name, destination, status }
        })
        .collect();

    PublishReport {
        output_dir: output_dir.to_path_buf(),
        entries,
    }
}

/// `rename`, falling back to copy + remove when the move crosses filesystems
fn move_file(source: &Path, destination: &Path) -> std::result::Result<(), String> {
    if !source.is_file() {
        return Err(format!("staged file {} not found", source.display()));
    }
    if same_file(source, destination) {
        return Ok(());
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            fs::copy(source, destination)
                .map_err(|e| format!("rename failed ({}), copy failed ({})", rename_err, e))?;
            if let Err(e) = fs::remove_file(source) {
                warn!(source = %source.display(), error = %e, "Copied artifact but could not remove staged file");
            }
            Ok(())
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
