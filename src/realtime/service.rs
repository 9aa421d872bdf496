//! # Real-Time Service
//!
//! Entry point for transports (subscribe, close, stats) and for domain
//! producers (the broadcaster).

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::broadcaster::EventBroadcaster;
use super::config::RealtimeConfig;
use super::errors::{RealtimeError, RealtimeResult};
use super::event::OutboundMessage;
use super::gate::AuthorizationGate;
use super::lifecycle::{SubscriptionHandle, SubscriptionLifecycle, TerminationReason};
use super::registry::ConnectionRegistry;
use super::scope::{Principal, ProjectId, Scope, SubscriptionId, UserId};
use super::sink::{ChannelSink, EventSink};
use super::stream::SubscriptionStream;
use super::subscription::{Delivery, Subscription};
use crate::observability::MetricsRegistry;

/// What a subscribe request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeTarget {
    /// Issue events for one project, or for every project when `None`
    Issues(Option<ProjectId>),
    /// Events addressed to the calling user
    UserEvents,
}

/// Which live count to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsQuery {
    Total,
    Project(ProjectId),
    User(UserId),
}

/// Live connection counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConnectionStats {
    #[serde(rename_all = "camelCase")]
    Total { total_active_connections: usize },
    #[serde(rename_all = "camelCase")]
    Project {
        project_id: ProjectId,
        active_connections: usize,
    },
    #[serde(rename_all = "camelCase")]
    User {
        user_id: UserId,
        active_connections: usize,
    },
}

/// Subscription registry, lifecycle and broadcaster behind one facade
pub struct RealtimeService {
    config: RealtimeConfig,
    registry: Arc<ConnectionRegistry>,
    lifecycle: SubscriptionLifecycle,
    broadcaster: EventBroadcaster,
    gate: Arc<dyn AuthorizationGate>,
    metrics: Arc<MetricsRegistry>,
}

impl RealtimeService {
    pub fn new(config: RealtimeConfig, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self::with_metrics(config, gate, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(
        config: RealtimeConfig,
        gate: Arc<dyn AuthorizationGate>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let lifecycle = SubscriptionLifecycle::new(Arc::clone(&registry), Arc::clone(&metrics));
        let broadcaster = EventBroadcaster::new(lifecycle.clone(), Arc::clone(&metrics));

        Self {
            config,
            registry,
            lifecycle,
            broadcaster,
            gate,
            metrics,
        }
    }

    /// Open a channel-backed subscription for `principal`.
    ///
    /// Project access is checked once, here, before anything is registered.
    /// The first message on the returned stream is the `connected`
    /// acknowledgement.
    pub async fn subscribe(
        &self,
        principal: &Principal,
        target: SubscribeTarget,
    ) -> RealtimeResult<SubscriptionStream> {
        let (sink, events) = ChannelSink::new(self.config.sink_buffer);
        let handle = self
            .subscribe_with_sink(principal, target, Box::new(sink))
            .await?;
        Ok(SubscriptionStream::new(
            handle,
            events,
            self.config.subscription_timeout(),
        ))
    }

    /// Open a subscription over a caller-supplied sink.
    ///
    /// The acknowledgement is sent before the subscription is registered.
    /// If it cannot be sent the subscription is never registered and the
    /// returned handle is already terminated with `DeliveryFailure`.
    pub async fn subscribe_with_sink(
        &self,
        principal: &Principal,
        target: SubscribeTarget,
        sink: Box<dyn EventSink>,
    ) -> RealtimeResult<SubscriptionHandle> {
        let scope = self.authorize(principal, target).await?;

        let subscription = Subscription::new(scope, sink).with_principal(*principal);

        // Not yet registered, so no publish can reach the sink before the ack.
        let ack = OutboundMessage::connected(connected_text(scope));
        if let Delivery::Failed(error) = subscription.deliver(&ack).await {
            warn!(
                subscription_id = %subscription.id(),
                error = %error,
                "connection acknowledgement failed"
            );
            return Ok(self
                .lifecycle
                .discard(subscription, TerminationReason::DeliveryFailure));
        }

        Ok(self.lifecycle.activate(subscription))
    }

    /// Resolve the scope for a subscribe request, enforcing project access
    async fn authorize(
        &self,
        principal: &Principal,
        target: SubscribeTarget,
    ) -> RealtimeResult<Scope> {
        match target {
            SubscribeTarget::Issues(None) => Ok(Scope::Global),
            SubscribeTarget::UserEvents => Ok(Scope::User(principal.user_id)),
            SubscribeTarget::Issues(Some(project)) => {
                if !self.gate.project_exists(project).await {
                    self.metrics.increment_subscribe_not_found();
                    return Err(RealtimeError::NotFound(project.to_string()));
                }
                if !self.gate.can_subscribe(principal, project).await {
                    self.metrics.increment_authorization_denials();
                    info!(
                        user_id = %principal.user_id,
                        project_id = %project,
                        "subscribe denied"
                    );
                    return Err(RealtimeError::AuthorizationDenied);
                }
                Ok(Scope::Project(project))
            }
        }
    }

    /// Explicitly close a subscription owned by `principal`.
    ///
    /// Subscriptions owned by someone else are reported as not found.
    pub fn close(&self, principal: &Principal, id: SubscriptionId) -> RealtimeResult<()> {
        let subscription = self
            .registry
            .get(id)
            .filter(|s| s.principal() == Some(*principal))
            .ok_or_else(|| RealtimeError::SubscriptionNotFound(id.to_string()))?;

        self.lifecycle
            .terminate(&subscription, TerminationReason::Closed);
        Ok(())
    }

    /// Live connection counts
    pub fn stats(&self, query: StatsQuery) -> ConnectionStats {
        match query {
            StatsQuery::Total => ConnectionStats::Total {
                total_active_connections: self.registry.count(),
            },
            StatsQuery::Project(project_id) => ConnectionStats::Project {
                project_id,
                active_connections: self.registry.count_for_project(project_id),
            },
            StatsQuery::User(user_id) => ConnectionStats::User {
                user_id,
                active_connections: self.registry.count_for_user(user_id),
            },
        }
    }

    /// Handle for domain producers
    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}

fn connected_text(scope: Scope) -> String {
    match scope {
        Scope::Global => "Connected to issue updates".to_string(),
        Scope::Project(project) => format!("Connected to issue updates for project {}", project),
        Scope::User(user) => format!("Connected to user events for user {}", user),
    }
}
