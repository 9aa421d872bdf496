//! # HTTP Server Module
//!
//! Axum transport for the broadcast core.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/sse/issues` - Issue events, global or per project
//! - `/api/sse/user` - Events addressed to the caller
//! - `/api/sse/stats` - Live connection counts
//! - `/api/sse/subscriptions/:id` - Close a subscription
//! - `/observability/*` - Counters

pub mod auth;
pub mod config;
pub mod observability_routes;
pub mod realtime_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
