//! Shooter Telemetry - standalone reporter
//!
//! Runs the periodic reporter over a traffic counter store until Ctrl-C.

use anyhow::Result;
use clap::Parser;
use shooter_telemetry::{cli::Cli, config::Config, Reporter, TrafficStats};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load_from_cli(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Report Interval: {:?}", config.report.effective_interval());
    info!(
        "Collector URL: {}",
        config.report.destination().unwrap_or("Not configured")
    );
    info!("Management IP: {}", config.report.management_ip);
    info!("-------------------------------------------------------");

    let stats = Arc::new(TrafficStats::new());
    let mut reporter = Reporter::new(&config.report, stats)?;
    reporter.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping reporter...");
    reporter.stop().await;

    Ok(())
}
