//! Integration test: Server API endpoints

use ccpp_xai::config::{PipelineConfig, FEATURE_COLUMNS, TARGET_COLUMN};
use ccpp_xai::data::ObservationTable;
use ccpp_xai::pipeline::XaiPipeline;
use ccpp_xai::server::{create_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ndarray::{Array1, Array2};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn plant_table(n_rows: usize) -> ObservationTable {
    let x = Array2::from_shape_fn((n_rows, 4), |(i, j)| {
        let t = i as f64;
        match j {
            0 => 5.0 + (t * 0.37) % 30.0,
            1 => 30.0 + (t * 1.3) % 45.0,
            2 => 1000.0 + (t * 0.71) % 30.0,
            _ => 40.0 + (t * 2.9) % 55.0,
        }
    });
    let y = Array1::from_iter(
        x.outer_iter()
            .map(|r| 497.0 - 1.8 * r[0] - 0.25 * r[1] + 0.06 * (r[2] - 1013.0) - 0.15 * r[3]),
    );
    let names: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    ObservationTable::from_arrays(&x, &y, &names, TARGET_COLUMN).unwrap()
}

/// Run a small pipeline publishing into `dir` and build the router over it
fn test_app(dir: &Path) -> axum::Router {
    let config = PipelineConfig::new()
        .with_n_estimators(5)
        .with_max_depth(5)
        .with_staging_dir(dir)
        .with_output_dir(dir.join("assets"))
        .with_png_scale(0.5);
    let pipeline = XaiPipeline::run_with_table(config, plant_table(120)).unwrap();
    let state = Arc::new(AppState::new(Arc::new(pipeline.report()), dir.join("assets")));
    create_router(state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get(test_app(dir.path()), "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_report_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get(test_app(dir.path()), "/api/report").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["n_test"], 24);
    assert_eq!(json["instance_index"], 19);
    assert_eq!(json["feature_names"], serde_json::json!(["AT", "V", "AP", "RH"]));
    assert_eq!(json["local_explanation"]["contributions"].as_array().unwrap().len(), 4);
    assert!(json["test_r2"].as_f64().unwrap() <= 1.0);
}

#[tokio::test]
async fn test_root_serves_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get(test_app(dir.path()), "/").await;
    assert_eq!(status, StatusCode::OK);

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("R² train"));
    assert!(html.contains("/assets/summary_plot.png"));
    assert!(html.contains("/assets/dependence_plot_RH.png"));
    assert!(html.contains("/force-plot"));
}

#[tokio::test]
async fn test_force_plot_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, body) = get(app.clone(), "/force-plot").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("f(x) ="));

    std::fs::remove_file(dir.path().join("assets").join("force_plot_instance.html")).unwrap();
    let (status, body) = get(app, "/force-plot").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], "force_plot_instance.html has not been published");
}

#[tokio::test]
async fn test_assets_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get(test_app(dir.path()), "/assets/detailed_summary_plot.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get(test_app(dir.path()), "/api/models").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_post_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/report")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
