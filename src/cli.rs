use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Two-line Claude Code statusline")]
pub struct Config {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Summarize the session log: per-day costs, tokens, and an approximate
    /// session count
    Stats,

    /// Detached background refresh worker (spawned internally)
    #[command(hide = true)]
    Refresh {
        /// Resource to refresh: limits, usage, or pricing
        key: String,
    },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
