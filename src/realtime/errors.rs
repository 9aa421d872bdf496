//! # Real-Time Errors
//!
//! Error types for the real-time module.
//!
//! Only subscribe-time failures are ever surfaced to a caller. Delivery
//! problems live in [`SinkError`](super::sink::SinkError) and are resolved
//! inside the core by terminating the affected subscription.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    // ==================
    // Subscribe Errors
    // ==================
    /// Principal may not subscribe to the requested project
    #[error("You don't have access to this project")]
    AuthorizationDenied,

    /// Subscribe targeted a project that does not exist
    #[error("Project not found with id: {0}")]
    NotFound(String),

    /// No principal was supplied by the authentication layer
    #[error("Authentication required")]
    AuthenticationRequired,

    // ==================
    // Lifecycle Errors
    // ==================
    /// No active subscription with this id
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),
}

impl RealtimeError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RealtimeError::AuthenticationRequired => 401,
            RealtimeError::AuthorizationDenied => 403,
            RealtimeError::NotFound(_) => 404,
            RealtimeError::SubscriptionNotFound(_) => 404,
        }
    }
}
