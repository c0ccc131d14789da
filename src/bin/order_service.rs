//! # Order Service
//!
//! Long-running consumer process: persists order events from the orders topic
//! and dead-letters whatever it cannot process. Runs until Ctrl-C or SIGTERM.
//!
//! Exits with status 1 when the broker cannot be reached at startup.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use order_pipeline::bootstrap::bootstrap_consumer;
use order_pipeline::config::ConfigManager;
use order_pipeline::logging::init_structured_logging;

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Consume order events and persist them")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: $ORDERS_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Environment override (default: $ORDERS_ENV, $APP_ENV or development)
    #[arg(short, long)]
    environment: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.environment {
        Some(env) => ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), env),
        None => ConfigManager::load_from_directory(cli.config_dir.clone()),
    }
    .context("failed to load configuration")?;
    let config = manager.config();

    init_structured_logging(&config.logging);
    info!(
        environment = %manager.environment(),
        config = %manager.debug_config(),
        "🚀 ORDER_SERVICE: Starting"
    );

    let mut system = match bootstrap_consumer(config).await {
        Ok(system) => system,
        Err(e) if e.is_connection_error() => {
            error!(error = %e, "❌ ORDER_SERVICE: Broker unreachable, exiting");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to bootstrap order consumer"),
    };

    system.start();
    info!("✅ ORDER_SERVICE: Consuming, press Ctrl-C to stop");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("🛑 ORDER_SERVICE: Interrupt received");
        }
        _ = wait_for_sigterm() => {
            info!("🛑 ORDER_SERVICE: SIGTERM received");
        }
    }

    system.shutdown().await?;
    info!(status = ?system.status(), "👋 ORDER_SERVICE: Stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
