//! # Event Broadcaster
//!
//! Fans one event out to every subscription its targeting selects.
//!
//! ## Delivery semantics
//! Best-effort. Each resolved subscription gets exactly one delivery
//! attempt; a failed attempt terminates that subscription and is otherwise
//! swallowed. Publishers never see delivery errors. When `publish` returns,
//! every resolved subscriber has either accepted the message or been
//! removed from the registry.

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::event::Event;
use super::lifecycle::{SubscriptionLifecycle, TerminationReason};
use super::registry::ConnectionRegistry;
use super::scope::{ProjectId, UserId};
use super::subscription::Delivery;
use crate::observability::MetricsRegistry;

/// Result of dispatching one event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Subscriptions selected by the event's targeting
    pub matched: usize,
    /// Messages accepted by a sink
    pub delivered: usize,
    /// Subscriptions terminated between snapshot and send
    pub skipped: usize,
    /// Deliveries that failed and terminated their subscription
    pub failed: usize,
}

/// Publishes domain events to live subscriptions
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    lifecycle: SubscriptionLifecycle,
    metrics: Arc<MetricsRegistry>,
}

impl EventBroadcaster {
    pub fn new(lifecycle: SubscriptionLifecycle, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            registry: Arc::clone(lifecycle.registry()),
            lifecycle,
            metrics,
        }
    }

    /// Publish an event. Never fails and never reports delivery problems.
    pub async fn publish(&self, event: &Event) {
        self.dispatch(event).await;
    }

    /// Publish an event and report what happened to each recipient
    pub async fn dispatch(&self, event: &Event) -> DispatchReport {
        let recipients = self.registry.subscribers_for(&event.targeting);
        let message = event.to_message();
        self.metrics.increment_events_published();

        let outcomes = join_all(recipients.iter().map(|subscription| {
            let message = &message;
            async move {
                let outcome = subscription.deliver(message).await;
                if let Delivery::Failed(ref error) = outcome {
                    warn!(
                        subscription_id = %subscription.id(),
                        scope = %subscription.scope(),
                        kind = %event.kind,
                        error = %error,
                        "delivery failed, dropping subscriber"
                    );
                    self.lifecycle
                        .terminate(subscription, TerminationReason::DeliveryFailure);
                }
                outcome
            }
        }))
        .await;

        let mut report = DispatchReport {
            matched: recipients.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Delivery::Delivered => {
                    report.delivered += 1;
                    self.metrics.increment_deliveries_succeeded();
                }
                Delivery::Skipped => report.skipped += 1,
                Delivery::Failed(_) => {
                    report.failed += 1;
                    self.metrics.increment_deliveries_failed();
                }
            }
        }

        debug!(
            kind = %event.kind,
            targeting = %event.targeting,
            matched = report.matched,
            delivered = report.delivered,
            failed = report.failed,
            "event published"
        );
        report
    }

    /// Publish to a project's subscribers and every global subscriber
    pub async fn publish_to_project(&self, kind: &str, project: ProjectId, payload: Value) {
        self.publish(&Event::for_project(kind, project, payload)).await;
    }

    /// Publish to one user's subscriptions
    pub async fn publish_to_user(&self, kind: &str, user: UserId, payload: Value) {
        self.publish(&Event::for_users(kind, [user], payload)).await;
    }

    /// Publish to the user subscriptions of every listed member
    pub async fn publish_to_members<I>(&self, kind: &str, members: I, payload: Value)
    where
        I: IntoIterator<Item = UserId>,
    {
        self.publish(&Event::for_users(kind, members, payload)).await;
    }
}
