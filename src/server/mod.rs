//! Report server
//!
//! Read-only web layer over a finished pipeline run: the dashboard, the
//! published artifacts, the force plot and the JSON report.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DEFAULT_OUTPUT_DIR;
use crate::pipeline::PipelineReport;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the published artifacts
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            assets_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

/// Serve `report` and its published artifacts until ctrl+c
pub async fn run_server(config: ServerConfig, report: Arc<PipelineReport>) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    if !config.assets_dir.exists() {
        warn!(assets_dir = %config.assets_dir.display(), "Assets directory not found, charts will be unavailable");
    }

    let state = Arc::new(AppState::new(report, config.assets_dir.clone()));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        started_at = %start_time.to_rfc3339(),
        "Report server starting"
    );
    info!(url = %format!("http://{}", addr), "Dashboard available");
    info!(url = %format!("http://{}/api/report", addr), "Report endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, stopping server");
            return;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    info!("Server started successfully (press ctrl+c to stop)");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8050);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));

        let config = config.with_host("0.0.0.0").with_port(9000);
        assert_eq!((config.host.as_str(), config.port), ("0.0.0.0", 9000));
    }
}
