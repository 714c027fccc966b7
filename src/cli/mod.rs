//! Command-line interface.
//!
//! Entry points for operating a Crossbar session. The interactive command
//! grammar itself lives outside this crate; `start` brings the session up
//! and parks until an administrative exit.

pub mod commands;

use clap::{Parser, Subcommand};

/// Crossbar - CLI bridge to a replicated configuration database.
#[derive(Parser, Debug)]
#[command(name = "crossbar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a session and serve until an administrative exit.
    Start(commands::StartArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}
