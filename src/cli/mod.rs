//! Command-line interface
//!
//! `ccpp-xai [run]` reproduces the report with the fixed defaults;
//! `ccpp-xai serve` runs it and then serves the results.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pipeline::{PublishStatus, XaiPipeline};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(230, 90, 90) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ccpp-xai")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explainability report for a combined cycle power plant regression model")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON file overriding the default pipeline configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Input workbook or CSV (overrides the configuration)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Output directory for the artifacts (overrides the configuration)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train, explain and publish the report artifacts (default)
    Run,

    /// Run the pipeline, then serve the dashboard and artifacts
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8050")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

impl Cli {
    /// Defaults, then the JSON file, then command-line overrides
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(config: PipelineConfig) -> anyhow::Result<XaiPipeline> {
    section("Explainability report");
    println!("  {}", kv("Data   ", &config.data_path.display().to_string()));
    println!("  {}", kv("Output ", &config.output_dir.display().to_string()));
    println!();

    step_run(&format!(
        "Fitting {} trees and computing SHAP values",
        config.n_estimators.to_string().cyan()
    ));
    let start = Instant::now();
    let pipeline = XaiPipeline::run(config)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_summary(&pipeline);
    if pipeline.artifact_paths().is_empty() {
        anyhow::bail!("no artifact was published to {}", pipeline.config().output_dir.display());
    }
    Ok(pipeline)
}

fn print_summary(pipeline: &XaiPipeline) {
    let report = pipeline.report();

    section("Scores");
    println!("  {:<16} {}", muted("R² train"), format!("{:.2}", report.train_r2).white().bold());
    println!("  {:<16} {}", muted("R² test"), format!("{:.2}", report.test_r2).white().bold());
    println!("  {:<16} {}", muted("n test"), report.n_test.to_string().white());
    println!("  {:<16} {}", muted("Base value"), format!("{:.2}", report.base_value).white());

    section("Feature importance");
    println!("  {:<16} {:>10} {:>10}", "", dim("mean |SHAP|"), dim("impurity"));
    for importance in &report.importances {
        println!(
            "  {:<16} {:>10} {:>10}",
            muted(&importance.feature),
            format!("{:.3}", importance.mean_abs_shap).white(),
            format!("{:.1}%", importance.impurity_importance * 100.0).white()
        );
    }

    section("Artifacts");
    for entry in &report.artifacts {
        match &entry.status {
            PublishStatus::Published => println!("  {} {}", ok("✓"), entry.destination.display()),
            PublishStatus::Failed { reason } => println!("  {} {} {}", bad("✗"), entry.file_name, dim(reason)),
        }
    }
    println!();
}

pub async fn cmd_serve(config: PipelineConfig, host: &str, port: u16) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let assets_dir = config.output_dir.clone();
    let pipeline = tokio::task::spawn_blocking(move || cmd_run(config)).await??;
    let report = Arc::new(pipeline.report());

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "CCPP explainability report".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Dashboard ", &format!("http://{}:{}", host, port)));
    line_box(&kv("Report    ", &format!("http://{}:{}/api/report", host, port)));
    line_box(&kv("Health    ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let server_config = ServerConfig::default()
        .with_host(host)
        .with_port(port)
        .with_assets_dir(assets_dir);

    run_server(server_config, report).await
}
