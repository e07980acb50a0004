//! End-to-end explainability pipeline
//!
//! Load → split → standardize → fit forest → score → TreeSHAP → render
//! charts and the local explanation → publish into the output directory.
//! Everything up to scoring is fatal on error; each rendered or published
//! file succeeds or fails on its own.

mod artifacts;

pub use artifacts::{publish, Artifact, PublishEntry, PublishReport, PublishStatus, StagedArtifact};

use crate::config::PipelineConfig;
use crate::data::{DatasetLoader, ObservationTable};
use crate::error::{Result, XaiError};
use crate::explainability::{LocalExplanation, ShapValues, TreeExplainer};
use crate::preprocessing::{train_test_split, StandardScaler, TrainTestSplit};
use crate::training::{RandomForest, RegressionMetrics};
use crate::visualization::{approximate_interactions, DependencePlot, ForcePlot, Rasterizer, SummaryPlot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Relative tolerance of the SHAP additivity check
const ADDITIVITY_TOLERANCE: f64 = 1e-6;

/// Global importance of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Mean |SHAP| over the test partition, in target units
    pub mean_abs_shap: f64,
    /// Forest impurity decrease share (all features sum to 1)
    pub impurity_importance: f64,
}

/// Serializable summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Utc>,
    pub data_path: PathBuf,
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub n_train: usize,
    pub n_test: usize,
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_metrics: RegressionMetrics,
    pub test_metrics: RegressionMetrics,
    pub base_value: f64,
    /// Features by decreasing mean |SHAP|
    pub importances: Vec<FeatureImportance>,
    pub instance_index: usize,
    pub local_explanation: LocalExplanation,
    pub output_dir: PathBuf,
    pub artifacts: Vec<PublishEntry>,
}

/// A completed pipeline run with read-only access to its results
#[derive(Debug)]
pub struct XaiPipeline {
    config: PipelineConfig,
    split: TrainTestSplit,
    scaler: StandardScaler,
    forest: RandomForest,
    train_metrics: RegressionMetrics,
    test_metrics: RegressionMetrics,
    shap_values: ShapValues,
    local_explanation: LocalExplanation,
    publish_report: PublishReport,
    finished_at: DateTime<Utc>,
}

impl XaiPipeline {
    /// Load `config.data_path` and run every step
    pub fn run(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let table = DatasetLoader::new()
            .with_columns(&config.feature_columns, &config.target_column)
            .load(&config.data_path)?;
        Self::run_with_table(config, table)
    }

    /// Run every step on an already loaded table
    pub fn run_with_table(config: PipelineConfig, table: ObservationTable) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();

        if table.feature_names() != config.feature_columns.as_slice() || table.target_name() != config.target_column {
            return Err(XaiError::DataFormatError(format!(
                "table columns {:?} -> {} do not match configured {:?} -> {}",
                table.feature_names(),
                table.target_name(),
                config.feature_columns,
                config.target_column
            )));
        }

        let x = table.features()?;
        let y = table.target()?;
        let feature_names = table.feature_names().to_vec();

        // Split
        let split = train_test_split(table.n_rows(), config.test_size, config.split_seed)?;
        let (x_train_raw, x_test_raw, y_train, y_test) = split.apply(&x, &y)?;
        info!(n_train = split.n_train(), n_test = split.n_test(), seed = config.split_seed, "Data split");

        // Standardize
        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&x_train_raw)?;
        let x_test = scaler.transform(&x_test_raw)?;

        // Fit
        let fit_start = Instant::now();
        let mut forest = RandomForest::new_regressor(config.n_estimators)
            .with_max_depth(config.max_depth)
            .with_random_state(config.forest_seed);
        forest.fit(&x_train, &y_train)?;
        info!(
            n_estimators = config.n_estimators,
            max_depth = config.max_depth,
            elapsed_ms = fit_start.elapsed().as_millis() as u64,
            "Random forest fitted"
        );

        // Score
        let train_pred = forest.predict(&x_train)?;
        let test_pred = forest.predict(&x_test)?;
        let train_metrics = RegressionMetrics::compute(&y_train, &train_pred)?;
        let test_metrics = RegressionMetrics::compute(&y_test, &test_pred)?;
        info!(
            train_r2 = %format!("{:.2}", train_metrics.r2),
            test_r2 = %format!("{:.2}", test_metrics.r2),
            test_rmse = %format!("{:.3}", test_metrics.rmse),
            "Model scored"
        );

        // Explain
        let explainer = TreeExplainer::new(&forest)?.with_feature_names(feature_names.clone())?;
        let shap_values = explainer.shap_values(&x_test)?.with_data(x_test_raw)?;
        let tolerance = ADDITIVITY_TOLERANCE * test_pred.iter().fold(1.0f64, |m, p| m.max(p.abs()));
        if let Err(e) = shap_values.verify(&test_pred, tolerance) {
            warn!(error = %e, "SHAP additivity check failed");
        }
        info!(base_value = %format!("{:.3}", shap_values.base_value()), "SHAP values computed");

        let local_explanation = shap_values.explain(config.instance_index)?;
        debug!(
            instance = config.instance_index,
            prediction = local_explanation.prediction,
            "Local explanation computed"
        );

        // Render and publish
        let staged = render_artifacts(&config, &shap_values, &local_explanation);
        let publish_report = publish(&staged, &config.output_dir);

        let published = publish_report.published().count();
        let failed = publish_report.failed().count();
        if failed > 0 {
            warn!(published, failed, output_dir = %config.output_dir.display(), "Pipeline finished with skipped artifacts");
        } else {
            info!(
                published,
                output_dir = %config.output_dir.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline finished"
            );
        }

        Ok(Self {
            config,
            split,
            scaler,
            forest,
            train_metrics,
            test_metrics,
            shap_values,
            local_explanation,
            publish_report,
            finished_at: Utc::now(),
        })
    }

    /// R² on the training partition
    pub fn train_score(&self) -> f64 {
        self.train_metrics.r2
    }

    /// R² on the test partition
    pub fn test_score(&self) -> f64 {
        self.test_metrics.r2
    }

    pub fn train_metrics(&self) -> &RegressionMetrics {
        &self.train_metrics
    }

    pub fn test_metrics(&self) -> &RegressionMetrics {
        &self.test_metrics
    }

    pub fn base_value(&self) -> f64 {
        self.shap_values.base_value()
    }

    /// SHAP values of the test partition (data in original units)
    pub fn shap_values(&self) -> &ShapValues {
        &self.shap_values
    }

    /// Explanation of the configured instance
    pub fn local_explanation(&self) -> &LocalExplanation {
        &self.local_explanation
    }

    /// Explain any test-partition row
    pub fn explain_instance(&self, index: usize) -> Result<LocalExplanation> {
        self.shap_values.explain(index)
    }

    /// Files that reached the output directory
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        self.publish_report.published_paths()
    }

    pub fn publish_report(&self) -> &PublishReport {
        &self.publish_report
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn report(&self) -> PipelineReport {
        let importance = self.shap_values.mean_abs();
        let impurity = self.forest.feature_importances();
        let importances = self
            .shap_values
            .importance_order()
            .into_iter()
            .map(|j| FeatureImportance {
                feature: self.shap_values.feature_names()[j].clone(),
                mean_abs_shap: importance[j],
                impurity_importance: impurity.map_or(0.0, |imp| imp[j]),
            })
            .collect();

        PipelineReport {
            generated_at: self.finished_at,
            data_path: self.config.data_path.clone(),
            feature_names: self.shap_values.feature_names().to_vec(),
            target_name: self.config.target_column.clone(),
            n_train: self.split.n_train(),
            n_test: self.split.n_test(),
            train_r2: self.train_score(),
            test_r2: self.test_score(),
            train_metrics: self.train_metrics,
            test_metrics: self.test_metrics,
            base_value: self.base_value(),
            importances,
            instance_index: self.local_explanation.instance_index,
            local_explanation: self.local_explanation.clone(),
            output_dir: self.publish_report.output_dir.clone(),
            artifacts: self.publish_report.entries.clone(),
        }
    }
}

/// Render every artifact into the staging directory, creating it first.
/// A failing chart is logged and recorded; the others are still attempted.
fn render_artifacts(
    config: &PipelineConfig,
    shap: &ShapValues,
    explanation: &LocalExplanation,
) -> Vec<StagedArtifact> {
    let rasterizer = Rasterizer::new(config.png_scale);
    let summary = SummaryPlot::default();
    let dependence = DependencePlot::default();
    let force = ForcePlot::default().with_output_name(config.target_column.clone());

    if let Err(e) = std::fs::create_dir_all(&config.staging_dir) {
        let reason = format!("cannot create staging directory {}: {}", config.staging_dir.display(), e);
        warn!(staging_dir = %config.staging_dir.display(), error = %e, "Nothing can be rendered");
        return Artifact::all(shap.feature_names())
            .into_iter()
            .map(|artifact| StagedArtifact { artifact, staged: Err(reason.clone()) })
            .collect();
    }

    Artifact::all(shap.feature_names())
        .into_iter()
        .map(|artifact| {
            let path = config.staging_dir.join(artifact.file_name());
            let start = Instant::now();

            let result = match &artifact {
                Artifact::SummaryPlot => summary
                    .render_beeswarm(shap)
                    .and_then(|svg| rasterizer.save_png(&svg, &path)),
                Artifact::DetailedSummaryPlot => summary
                    .render_bar(shap)
                    .and_then(|svg| rasterizer.save_png(&svg, &path)),
                Artifact::DependencePlot(feature) => render_dependence(&dependence, &rasterizer, shap, feature, &path),
                Artifact::ForcePlot => force.render(explanation).and_then(|html| write_text(&html, &path)),
            };

            let staged = match result {
                Ok(()) => {
                    debug!(
                        file = %artifact.file_name(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Artifact rendered"
                    );
                    Ok(path)
                }
                Err(e) => {
                    warn!(file = %artifact.file_name(), error = %e, "Artifact could not be rendered");
                    Err(e.to_string())
                }
            };

            StagedArtifact { artifact, staged }
        })
        .collect()
}

fn render_dependence(
    plot: &DependencePlot,
    rasterizer: &Rasterizer,
    shap: &ShapValues,
    feature: &str,
    path: &Path,
) -> Result<()> {
    let index = shap
        .feature_index(feature)
        .ok_or_else(|| XaiError::PlotError(format!("unknown feature {}", feature)))?;
    let interaction = approximate_interactions(index, shap)?.first().copied();
    if let Some(j) = interaction {
        debug!(feature, interaction = %shap.feature_names()[j], "Interaction feature chosen");
    }
    let svg = plot.render(shap, index, interaction)?;
    rasterizer.save_png(&svg, path)
}

fn write_text(text: &str, path: &Path) -> Result<()> {
    std::fs::write(path, text).map_err(|e| XaiError::ArtifactWriteError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
