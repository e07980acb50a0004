//! Request handlers for the report endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::json;
use tracing::debug;

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::pipeline::{Artifact, PipelineReport};
use crate::visualization::force::escape_html;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
    }))
}

/// Full pipeline report as JSON
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<PipelineReport> {
    Json(state.report.as_ref().clone())
}

/// The published force plot document, verbatim
pub async fn get_force_plot(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let path = state.assets_dir.join(Artifact::ForcePlot.file_name());
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => {
            debug!(path = %path.display(), bytes = html.len(), "Serving force plot");
            Ok(Html(html))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ServerError::ArtifactMissing(Artifact::ForcePlot.file_name()))
        }
        Err(e) => Err(ServerError::ArtifactRead(e)),
    }
}

/// Dashboard with the scores and every published chart
pub async fn serve_index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(&state.report))
}

fn render_index(report: &PipelineReport) -> String {
    let published = |name: &str| {
        report
            .artifacts
            .iter()
            .any(|a| a.file_name == name && a.is_published())
    };

    let mut figures = String::new();
    let mut charts = vec![
        (Artifact::SummaryPlot.file_name(), "SHAP summary (beeswarm)".to_string()),
        (Artifact::DetailedSummaryPlot.file_name(), "Mean |SHAP| per feature".to_string()),
    ];
    charts.extend(report.feature_names.iter().map(|f| {
        (
            Artifact::DependencePlot(f.clone()).file_name(),
            format!("Dependence plot: {}", f),
        )
    }));

    for (file, caption) in charts.iter().filter(|(file, _)| published(file)) {
        figures.push_str(&format!(
            "<figure><img src=\"/assets/{file}\" alt=\"{caption}\"><figcaption>{caption}</figcaption></figure>\n",
            file = escape_html(file),
            caption = escape_html(caption)
        ));
    }

    let force = if published(&Artifact::ForcePlot.file_name()) {
        "<iframe src=\"/force-plot\" title=\"Local explanation\"></iframe>".to_string()
    } else {
        "<p>The local explanation was not published.</p>".to_string()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Combined cycle power plant: explainability report</title>
<style>
body {{ font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; color: #222; }}
.badge {{ display: inline-block; border-radius: 999px; padding: 4px 14px; margin-right: 6px; color: white; font-size: 1.05rem; }}
.train {{ background: #18bc9c; }} .test {{ background: #3498db; }} .count {{ background: #95a5a6; }}
figure {{ margin: 24px auto; text-align: center; }}
figure img {{ width: 70%; max-width: 760px; }}
iframe {{ width: 100%; height: 520px; border: 0; box-shadow: 0 6px 18px rgba(0,0,0,0.08); border-radius: 12px; }}
</style>
</head>
<body>
<h1>Ambient conditions and electrical output of a combined cycle power plant</h1>
<p>Random forest regression of net hourly output {target} from ambient temperature (AT), exhaust vacuum (V),
ambient pressure (AP) and relative humidity (RH), explained with exact TreeSHAP values.</p>
<div>
<span class="badge train">R² train: {train:.2}</span>
<span class="badge test">R² test: {test:.2}</span>
<span class="badge count">n test: {n_test}</span>
</div>
<p>Base value (average model output): {base:.2}</p>
{figures}
<h2>Local explanation of test instance {instance}</h2>
{force}
</body>
</html>
"#,
        target = escape_html(&report.target_name),
        train = report.train_r2,
        test = report.test_r2,
        n_test = report.n_test,
        base = report.base_value,
        figures = figures,
        instance = report.instance_index,
        force = force,
    )
}
