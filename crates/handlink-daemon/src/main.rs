//! Handlink Daemon - Main entry point
//!
//! Receives hand landmark frames from the tracker and drives the live
//! skeleton until interrupted.

mod app;
mod config;
mod pet;

use anyhow::Result;
use clap::Parser;
use handlink_core::ScalingFactor;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "handlink")]
#[command(about = "Hand landmark receiver and live skeleton driver")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "handlink.toml")]
    config: PathBuf,

    /// UDP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Uniform skeleton scaling factor
    #[arg(short, long)]
    scale: Option<f32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Handlink v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    // Command line overrides
    if let Some(port) = args.port {
        config.receiver.port = port;
    }
    if let Some(scale) = args.scale {
        config.skeleton.scaling_factor = ScalingFactor::new(scale)?;
    }

    info!(
        bind = %config.receiver.bind,
        port = config.receiver.port,
        scale = config.skeleton.scaling_factor.get(),
        "Configuration loaded"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    app::run(config, shutdown).await
}
