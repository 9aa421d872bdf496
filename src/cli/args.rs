//! CLI argument definitions using clap
//!
//! Commands:
//! - issuestream serve [--config <path>] [--port <port>]
//! - issuestream check-config [--config <path>]
//!
//! Without `--config` every setting takes its default.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// issuestream - real-time event streams for an issue tracker
#[derive(Parser, Debug)]
#[command(name = "issuestream")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the event stream server
    Serve {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
