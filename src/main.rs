//! Team Saver: buffered, chunked persistence for team records.
//!
//! # Usage
//!
//! ```bash
//! team-saver --capacity 100 --flush-interval-ms 1000 ingest < teams.jsonl
//! team-saver create --name platform --description "shared infra"
//! team-saver list --limit 10
//! ```
//!
//! Environment variables can also be used:
//! - `TEAM_SAVER_DATA_DIR`: Data directory for SQLite
//! - `TEAM_SAVER_CAPACITY`: Buffered teams that trigger a flush
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use team_saver::app::run;
use team_saver::config::Cli;
use team_saver::observability::tracing::init_tracing;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let cli = Cli::parse_args();

    // Initialize tracing/logging
    init_tracing(&cli.config.log_level, cli.config.log_format);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        // Wait for SIGTERM or SIGINT (Ctrl+C)
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for ctrl+c");
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        // Signal shutdown
        let _ = shutdown_tx.send(true);
    });

    run(cli, shutdown_rx).await?;

    tracing::debug!("Team Saver finished");
    Ok(())
}
