//! CLI module
//!
//! Provides command-line interface for:
//! - serve: Start the event stream server
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{build_service, check_config, load_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
