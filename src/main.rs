//! Crossbar - unified CLI entrypoint.
//!
//! Usage:
//!   crossbar start --config config/crossbar.toml
//!   crossbar config validate --config config/crossbar.toml
//!   crossbar config show

use anyhow::Result;
use clap::Parser;
use crossbar::cli::commands::{run_config, run_start};
use crossbar::cli::{Cli, Commands};
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/crossbar.toml"));

    match cli.command {
        Commands::Start(_args) => run_start(&config_path, cli.log_level.as_deref()).await,
        Commands::Config(args) => run_config(args),
    }
}
