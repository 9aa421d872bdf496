//! Structured logging setup
//!
//! Installs the process-wide `tracing` subscriber. `RUST_LOG` overrides the
//! configured level when set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::{ObservabilityError, ObservabilityResult};
use crate::config::LoggingConfig;

/// Build the level filter for `config`
pub fn env_filter(config: &LoggingConfig) -> ObservabilityResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ObservabilityError::InvalidFilter(format!("{}: {}", config.level, e))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> ObservabilityResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "issuestream=verbose".to_string(),
            json: false,
        };
        assert!(matches!(
            env_filter(&config),
            Err(ObservabilityError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_accepts_directive_list() {
        let config = LoggingConfig {
            level: "info,issuestream::realtime=debug".to_string(),
            json: true,
        };
        assert!(env_filter(&config).is_ok());
    }
}
