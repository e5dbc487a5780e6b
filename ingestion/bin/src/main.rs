mod config;
mod di;

use crate::config::{AppConfig, Cli};
use crate::di::create_app_module;
use anyhow::Context;
use clap::Parser;
use dayahead_application::{DayAheadService, RunOutcome};
use shaku::HasComponent;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env(cli).context("Configuration error")?;

    info!("Starting day-ahead price ingestion");

    let module = create_app_module(&config).context("Failed to build HTTP client")?;
    let service: Arc<dyn DayAheadService> = module.resolve();

    let outcome = match service.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Ingestion failed: {}", e);
            return Err(e).context("Day-ahead price ingestion failed");
        }
    };

    // Every non-error outcome exits successfully; schedulers rerun on their own.
    match outcome {
        RunOutcome::Written { path, rows } => {
            info!("Data saved to {} ({} rows)", path.display(), rows);
        }
        RunOutcome::AlreadyPresent { path } => {
            info!("File {} exists, nothing to do", path.display());
        }
        RunOutcome::Incomplete { day, rejection } => {
            warn!("No data written for {}: {}", day, rejection);
        }
    }

    Ok(())
}
