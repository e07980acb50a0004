//! CCPP explainability report - Main Entry Point

use clap::Parser;
use ccpp_xai::cli::{cmd_run, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ccpp_xai=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            cmd_serve(config, &host, port).await?;
        }
        // Default: one reproducible run
        Some(Commands::Run) | None => {
            tokio::task::spawn_blocking(move || cmd_run(config)).await??;
        }
    }

    Ok(())
}
