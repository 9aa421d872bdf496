//! # Real-Time Event Broadcast
//!
//! Fans committed domain events out to long-lived subscriber connections.
//!
//! ## Architecture
//!
//! - **Registry**: active subscriptions partitioned by scope
//!   (global, per-project, per-user)
//! - **Broadcaster**: resolves an event's targeting to subscribers and
//!   delivers best-effort, pruning failures
//! - **Lifecycle**: idempotent `Active -> Terminated` transition shared by
//!   every termination trigger
//! - **Gate**: project access check performed once at subscribe time
//! - **Service**: facade used by transports and producers

pub mod broadcaster;
pub mod config;
pub mod errors;
pub mod event;
pub mod gate;
pub mod lifecycle;
pub mod registry;
pub mod scope;
pub mod service;
pub mod sink;
pub mod stream;
pub mod subscription;

pub use broadcaster::{DispatchReport, EventBroadcaster};
pub use config::RealtimeConfig;
pub use errors::{RealtimeError, RealtimeResult};
pub use event::{kinds, Event, OutboundMessage};
pub use gate::{AuthorizationGate, MembershipGate, ProjectMembership};
pub use lifecycle::{SubscriptionHandle, SubscriptionLifecycle, TerminationReason};
pub use registry::ConnectionRegistry;
pub use scope::{Principal, ProjectId, Scope, SubscriptionId, Targeting, UserId};
pub use service::{ConnectionStats, RealtimeService, StatsQuery, SubscribeTarget};
pub use sink::{ChannelSink, EventSink, SinkError};
pub use stream::SubscriptionStream;
pub use subscription::{Delivery, Subscription, SubscriptionState};
