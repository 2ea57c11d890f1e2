//! EventNative - event collection server
//!
//! # Usage
//!
//! ```bash
//! eventnative
//! eventnative --config configs/eventnative.toml
//! eventnative --log-level debug
//! ```

mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use en_config::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// EventNative - event collection server
#[derive(Parser, Debug)]
#[command(name = "eventnative")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/eventnative.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = if cli.config.exists() {
        Config::from_file(&cli.config)?
    } else {
        tracing::warn!(
            config = %cli.config.display(),
            "config file not found, starting with defaults"
        );
        Config::default()
    };

    app::run(config).await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    Ok(())
}
