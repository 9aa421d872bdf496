//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::args::Command;
use super::errors::{CliError, CliResult};
use crate::config::Config;
use crate::http_server::HttpServer;
use crate::observability::{init_logging, MetricsRegistry};
use crate::realtime::{MembershipGate, RealtimeService};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Load configuration (defaults without a path), applying a port override
pub fn load_config(config_path: Option<&Path>, port: Option<u16>) -> CliResult<Config> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = port {
        config.server.port = port;
    }
    Ok(config)
}

/// Build the realtime service with the configured project memberships
pub fn build_service(config: &Config) -> RealtimeService {
    let gate = Arc::new(MembershipGate::new());
    for project in &config.projects {
        gate.add_project(project.id, project.owner);
        for member in &project.members {
            gate.add_member(project.id, *member);
        }
    }

    RealtimeService::with_metrics(
        config.realtime.clone(),
        gate,
        Arc::new(MetricsRegistry::new()),
    )
}

/// Start the event stream server
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let config = load_config(config_path, port)?;
    init_logging(&config.logging)?;

    let service = Arc::new(build_service(&config));
    info!(
        projects = config.projects.len(),
        sink_buffer = config.realtime.sink_buffer,
        "realtime service ready"
    );

    let server = HttpServer::new(config.server.clone(), service);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate a configuration file and print it with defaults filled in
pub fn check_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path, None)?;
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| CliError::io_error(format!("JSON error: {}", e)))?;
    println!("{}", json);
    Ok(())
}
