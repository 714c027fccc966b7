//! Start command implementation.

use crate::core::config::Config;
use crate::session::Session;
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

/// Start a Crossbar session.
///
/// Takes no arguments of its own; the config path and log level come from
/// the global flags.
#[derive(Args, Debug)]
pub struct StartArgs {}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Run the start command with the given config path.
pub async fn run_start(config_path: &Path, log_level: Option<&str>) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.validate()?;

    init_tracing(log_level.unwrap_or(&config.telemetry.log_level));

    let mut session = Session::initialize(config).await?;
    if !session.exit_requested() {
        session.wait_for_exit().await;
    }
    session.shutdown().await
}
