//! Configuration file
//!
//! A single JSON document. Every field has a default, so an empty object
//! is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::realtime::{ProjectId, RealtimeConfig, UserId};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per line (default: false)
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// A project known to the membership gate at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: ProjectId,
    pub owner: UserId,
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate ranges and addresses
    pub fn validate(&self) -> ConfigResult<()> {
        self.realtime.validate().map_err(ConfigError::Invalid)?;

        self.server.validate().map_err(ConfigError::Invalid)?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.projects.iter().find(|p| !seen.insert(p.id)) {
            return Err(ConfigError::Invalid(format!(
                "project {} is listed more than once",
                dup.id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_object_is_default() {
        let file = write_config("{}");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_overrides() {
        let file = write_config(
            r#"{
                "server": {"port": 8080},
                "realtime": {"sink_buffer": 32, "subscription_timeout_secs": 3600},
                "logging": {"level": "debug", "json": true}
            }"#,
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.realtime.sink_buffer, 32);
        assert_eq!(config.realtime.subscription_timeout_secs, Some(3600));
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/nonexistent/issuestream.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_config("{not json");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_values() {
        let file = write_config(r#"{"realtime": {"keep_alive_secs": 0}}"#);
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));

        let file = write_config(r#"{"server": {"host": "not a host"}}"#);
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_project() {
        let id = uuid::Uuid::new_v4();
        let owner = uuid::Uuid::new_v4();
        let file = write_config(&format!(
            r#"{{"projects": [{{"id": "{id}", "owner": "{owner}"}}, {{"id": "{id}", "owner": "{owner}"}}]}}"#
        ));
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
    }
}
