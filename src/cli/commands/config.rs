//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate a configuration file.
    Validate {
        /// Config file path.
        #[arg(short, long, default_value = "config/crossbar.toml")]
        config: PathBuf,
    },
    /// Print configuration with defaults applied.
    Show {
        /// Config file path.
        #[arg(short, long, default_value = "config/crossbar.toml")]
        config: PathBuf,
    },
}

/// Run the config command.
pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate { config } => validate_config(&config),
        ConfigCommand::Show { config } => show_config(&config),
    }
}

fn validate_config(path: &PathBuf) -> Result<()> {
    let config = Config::from_file(path)?;
    config.validate()?;
    println!("✓ {} is valid", path.display());
    println!("  store mode:     {}", config.store.mode);
    println!("  store socket:   {}", config.store.socket_address());
    println!("  control socket: {}", config.control_socket());
    Ok(())
}

fn show_config(path: &PathBuf) -> Result<()> {
    let config = Config::from_file(path)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
