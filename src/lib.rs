//! issuestream - real-time event broadcast for a multi-user issue tracker
//!
//! Domain producers hand committed events to the broadcaster; subscribers
//! hold long-lived Server-Sent Events connections scoped to every project,
//! one project, or themselves.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod realtime;
