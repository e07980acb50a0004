//! Integration test: load → split → fit → explain → publish

use ccpp_xai::config::PipelineConfig;
use ccpp_xai::error::XaiError;
use ccpp_xai::pipeline::XaiPipeline;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

const EXPECTED_FILES: [&str; 7] = [
    "summary_plot.png",
    "detailed_summary_plot.png",
    "dependence_plot_AT.png",
    "dependence_plot_V.png",
    "dependence_plot_AP.png",
    "dependence_plot_RH.png",
    "force_plot_instance.html",
];

/// Plant-like measurements: output falls with temperature and vacuum
fn write_plant_csv(path: &Path, n_rows: usize) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut csv = String::from("AT,V,AP,RH,PE\n");
    for _ in 0..n_rows {
        let at: f64 = rng.gen_range(2.0..35.0);
        let v: f64 = rng.gen_range(25.0..80.0);
        let ap: f64 = rng.gen_range(993.0..1033.0);
        let rh: f64 = rng.gen_range(25.0..100.0);
        let noise: f64 = rng.gen_range(-1.0..1.0);
        let pe = 497.0 - 1.8 * at - 0.25 * v + 0.06 * (ap - 1013.0) - 0.15 * rh + noise;
        csv.push_str(&format!("{:.2},{:.2},{:.2},{:.2},{:.2}\n", at, v, ap, rh, pe));
    }
    std::fs::write(path, csv).unwrap();
}

fn small_config(dir: &Path) -> PipelineConfig {
    let data = dir.join("plant.csv");
    if !data.exists() {
        write_plant_csv(&data, 150);
    }
    let staging = dir.join("staging");

    PipelineConfig::new()
        .with_data_path(data)
        .with_n_estimators(8)
        .with_max_depth(6)
        .with_staging_dir(staging)
        .with_output_dir(dir.join("assets"))
        .with_png_scale(1.0)
}

#[test]
fn test_pipeline_publishes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    let output_dir = config.output_dir.clone();

    let pipeline = XaiPipeline::run(config).expect("pipeline should succeed");

    let report = pipeline.publish_report();
    assert!(report.all_published(), "failed: {:?}", report.failed().collect::<Vec<_>>());
    assert_eq!(report.entries.len(), 7);

    let mut published: Vec<PathBuf> = pipeline.artifact_paths();
    published.sort();
    let mut expected: Vec<PathBuf> = EXPECTED_FILES.iter().map(|f| output_dir.join(f)).collect();
    expected.sort();
    assert_eq!(published, expected);

    for file in EXPECTED_FILES {
        let path = output_dir.join(file);
        assert!(path.is_file(), "{} missing", file);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        // Moved, not copied
        assert!(!dir.path().join("staging").join(file).exists());
    }

    let png = std::fs::read(output_dir.join("summary_plot.png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let html = std::fs::read_to_string(output_dir.join("force_plot_instance.html")).unwrap();
    assert!(html.contains("<html"));
    assert!(html.contains("base value"));
}

#[test]
fn test_pipeline_creates_missing_staging_dir() {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("build").join("stage");
    let config = small_config(dir.path()).with_staging_dir(staging.clone());
    let output_dir = config.output_dir.clone();

    let pipeline = XaiPipeline::run(config).unwrap();

    assert!(pipeline.publish_report().all_published());
    assert!(staging.is_dir());
    for file in EXPECTED_FILES {
        assert!(output_dir.join(file).is_file(), "{} missing", file);
    }
}

#[test]
fn test_unusable_staging_dir_fails_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = small_config(dir.path()).with_staging_dir(blocker.join("stage"));

    let pipeline = XaiPipeline::run(config).unwrap();

    let report = pipeline.publish_report();
    assert_eq!(report.entries.len(), 7);
    assert_eq!(report.failed().count(), 7);
    assert!(pipeline.artifact_paths().is_empty());
    let json = serde_json::to_value(&pipeline.report()).unwrap();
    assert_eq!(json["artifacts"][0]["status"], "failed");
    assert!(json["artifacts"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("cannot create staging directory"));
}

#[test]
fn test_pipeline_scores_and_additivity() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = XaiPipeline::run(small_config(dir.path())).unwrap();

    assert_eq!(pipeline.split().n_test(), 30);
    assert_eq!(pipeline.split().n_train(), 120);
    assert!(pipeline.train_score() > 0.9, "train R² = {}", pipeline.train_score());
    assert!(pipeline.test_score() > 0.7, "test R² = {}", pipeline.test_score());
    assert!(pipeline.train_score() <= 1.0);

    let shap = pipeline.shap_values();
    assert_eq!(shap.n_samples(), 30);
    assert_eq!(shap.n_features(), 4);
    assert_eq!(shap.feature_names(), ["AT", "V", "AP", "RH"]);

    // Attributions plus base value reproduce the forest output
    let (_, x_test, _, _) = {
        let table = ccpp_xai::data::DatasetLoader::new()
            .load(&pipeline.config().data_path)
            .unwrap();
        pipeline
            .split()
            .apply(&table.features().unwrap(), &table.target().unwrap())
            .unwrap()
    };
    let scaled = pipeline.scaler().transform(&x_test).unwrap();
    let predictions = pipeline.forest().predict(&scaled).unwrap();
    let reconstructed = shap.reconstructed_outputs();
    for (p, r) in predictions.iter().zip(reconstructed.iter()) {
        assert!((p - r).abs() < 1e-6 * p.abs().max(1.0), "{} vs {}", p, r);
    }

    // Plotted data stays in physical units
    assert_eq!(shap.data(), &x_test);

    // Temperature dominates the synthetic plant
    assert_eq!(shap.importance_order()[0], 0);

    let local = pipeline.local_explanation();
    assert_eq!(local.instance_index, 19);
    assert!((local.prediction - predictions[19]).abs() < 1e-6 * predictions[19].abs());
    assert!((local.base_value + local.sum_contributions() - local.prediction).abs() < 1e-9);
}

#[test]
fn test_pipeline_is_deterministic() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let first = XaiPipeline::run(small_config(first_dir.path())).unwrap();
    let second = XaiPipeline::run(small_config(second_dir.path())).unwrap();

    assert_eq!(first.split(), second.split());
    assert_eq!(first.train_score(), second.train_score());
    assert_eq!(first.test_score(), second.test_score());
    assert_eq!(first.base_value(), second.base_value());
    assert_eq!(first.shap_values().values(), second.shap_values().values());
    assert_eq!(first.local_explanation(), second.local_explanation());
}

#[test]
fn test_report_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = XaiPipeline::run(small_config(dir.path())).unwrap();
    let report = pipeline.report();

    assert_eq!(report.n_test, 30);
    assert_eq!(report.importances.len(), 4);
    assert!(report
        .importances
        .windows(2)
        .all(|w| w[0].mean_abs_shap >= w[1].mean_abs_shap));

    let impurity_total: f64 = report.importances.iter().map(|i| i.impurity_importance).sum();
    assert!((impurity_total - 1.0).abs() < 1e-9, "impurity shares sum to {}", impurity_total);
    assert_eq!(report.importances[0].feature, "AT");
    assert!(report.importances.iter().all(|i| i.impurity_importance <= report.importances[0].impurity_importance));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["instance_index"], 19);
    assert_eq!(json["artifacts"].as_array().unwrap().len(), 7);
    assert_eq!(json["artifacts"][0]["status"], "published");
}

#[test]
fn test_instance_out_of_bounds_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path()).with_instance_index(30);
    let output_dir = config.output_dir.clone();

    match XaiPipeline::run(config) {
        Err(XaiError::IndexOutOfBounds { index, len }) => {
            assert_eq!(index, 30);
            assert_eq!(len, 30);
        }
        other => panic!("expected IndexOutOfBounds, got {:?}", other.map(|_| ())),
    }
    assert!(!output_dir.exists(), "nothing should be published");
}

#[test]
fn test_explain_other_instances() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = XaiPipeline::run(small_config(dir.path())).unwrap();

    let first = pipeline.explain_instance(0).unwrap();
    assert_eq!(first.instance_index, 0);
    assert_eq!(first.contributions.len(), 4);
    assert!(matches!(
        pipeline.explain_instance(30),
        Err(XaiError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_missing_target_column() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("no_target.csv");
    std::fs::write(&data, "AT,V,AP,RH\n14.96,41.76,1024.07,73.17\n25.18,62.96,1020.04,59.08\n").unwrap();

    let config = small_config(dir.path()).with_data_path(data);
    let err = XaiPipeline::run(config).unwrap_err();
    assert!(matches!(err, XaiError::DataFormatError(_)), "got {:?}", err);
    assert!(err.to_string().contains("PE"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path()).with_data_path(dir.path().join("absent.csv"));
    let err = XaiPipeline::run(config).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_too_few_rows() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("one_row.csv");
    std::fs::write(&data, "AT,V,AP,RH,PE\n14.96,41.76,1024.07,73.17,463.26\n").unwrap();

    let config = small_config(dir.path()).with_data_path(data);
    assert!(matches!(
        XaiPipeline::run(config),
        Err(XaiError::InsufficientDataError { required: 2, actual: 1 })
    ));
}
