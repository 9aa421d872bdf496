//! Observability subsystem
//!
//! - Structured logging through `tracing`
//! - Lock-free operational counters
//!
//! Observability is read-only: nothing here influences delivery.

mod logging;
mod metrics;

pub use logging::{env_filter, init_logging};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use thiserror::Error;

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Observability errors. Never fatal to the broadcast core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    /// The log level directive could not be parsed
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
