//! # Subscription Lifecycle
//!
//! `Active -> Terminated`, nothing in between.
//!
//! Four triggers end a subscription: explicit close, timeout, transport
//! error and delivery failure. Every trigger funnels into
//! [`SubscriptionLifecycle::terminate`], which flips the subscription's
//! state flag with a single compare-and-set. The winner removes the
//! registry entry and releases the sink; every later trigger is a no-op.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::registry::ConnectionRegistry;
use super::scope::{Scope, SubscriptionId};
use super::subscription::Subscription;
use crate::observability::MetricsRegistry;

/// What ended a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerminationReason {
    /// The subscriber unsubscribed
    Closed = 1,
    /// The transport's idle/lifetime limit elapsed
    Timeout = 2,
    /// The transport reported the channel broke
    TransportError = 3,
    /// A send to the sink failed during a publish
    DeliveryFailure = 4,
}

impl TerminationReason {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Closed),
            2 => Some(Self::Timeout),
            3 => Some(Self::TransportError),
            4 => Some(Self::DeliveryFailure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Timeout => "timeout",
            Self::TransportError => "transport_error",
            Self::DeliveryFailure => "delivery_failure",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives subscriptions into and out of the registry
#[derive(Debug, Clone)]
pub struct SubscriptionLifecycle {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<MetricsRegistry>,
}

impl SubscriptionLifecycle {
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { registry, metrics }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Register a freshly created subscription and hand back its handle
    pub fn activate(&self, subscription: Subscription) -> SubscriptionHandle {
        let subscription = Arc::new(subscription);
        if self.registry.insert(Arc::clone(&subscription)) {
            self.metrics.increment_subscriptions_opened();
            info!(
                subscription_id = %subscription.id(),
                scope = %subscription.scope(),
                "subscription opened"
            );
        }

        SubscriptionHandle {
            subscription,
            lifecycle: self.clone(),
        }
    }

    /// End a subscription that was never registered.
    ///
    /// The returned handle is already terminated; the registry and the
    /// open/terminate counters are untouched.
    pub fn discard(
        &self,
        subscription: Subscription,
        reason: TerminationReason,
    ) -> SubscriptionHandle {
        let subscription = Arc::new(subscription);
        subscription.mark_terminated(reason);
        subscription.release_sink();
        debug!(
            subscription_id = %subscription.id(),
            reason = %reason,
            "subscription discarded before registration"
        );

        SubscriptionHandle {
            subscription,
            lifecycle: self.clone(),
        }
    }

    /// Terminate `subscription` for `reason`.
    ///
    /// Returns `true` only for the trigger that actually ended it.
    pub fn terminate(&self, subscription: &Subscription, reason: TerminationReason) -> bool {
        if !subscription.mark_terminated(reason) {
            debug!(
                subscription_id = %subscription.id(),
                reason = %reason,
                "subscription already terminated"
            );
            return false;
        }

        self.registry.remove(subscription);
        subscription.release_sink();
        self.metrics.record_termination(reason);

        info!(
            subscription_id = %subscription.id(),
            scope = %subscription.scope(),
            reason = %reason,
            lifetime_ms = subscription.age().num_milliseconds(),
            "subscription terminated"
        );
        true
    }
}

/// The transport's grip on one subscription.
///
/// Each trigger method is safe to call any number of times from any task.
/// Dropping a handle while the subscription is still active counts as a
/// transport error: the connection went away without saying goodbye.
#[derive(Debug)]
pub struct SubscriptionHandle {
    subscription: Arc<Subscription>,
    lifecycle: SubscriptionLifecycle,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    pub fn scope(&self) -> Scope {
        self.subscription.scope()
    }

    pub fn subscription(&self) -> &Arc<Subscription> {
        &self.subscription
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.subscription.termination_reason()
    }

    /// Caller-initiated unsubscribe
    pub fn close(&self) -> bool {
        self.lifecycle
            .terminate(&self.subscription, TerminationReason::Closed)
    }

    /// The transport's timeout elapsed
    pub fn timed_out(&self) -> bool {
        self.lifecycle
            .terminate(&self.subscription, TerminationReason::Timeout)
    }

    /// The transport reported a broken channel
    pub fn transport_failed(&self) -> bool {
        self.lifecycle
            .terminate(&self.subscription, TerminationReason::TransportError)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if self.subscription.is_active() {
            self.transport_failed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::sink::ChannelSink;
    use uuid::Uuid;

    fn lifecycle() -> SubscriptionLifecycle {
        SubscriptionLifecycle::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(MetricsRegistry::new()),
        )
    }

    fn open(lifecycle: &SubscriptionLifecycle, scope: Scope) -> SubscriptionHandle {
        let (sink, _rx) = ChannelSink::new(4);
        lifecycle.activate(Subscription::new(scope, Box::new(sink)))
    }

    #[test]
    fn test_discard_never_registers() {
        let lifecycle = lifecycle();
        let (sink, _rx) = ChannelSink::new(4);

        let handle = lifecycle.discard(
            Subscription::new(Scope::Global, Box::new(sink)),
            TerminationReason::DeliveryFailure,
        );

        assert_eq!(
            handle.termination_reason(),
            Some(TerminationReason::DeliveryFailure)
        );
        assert!(handle.subscription().sink_released());
        assert!(lifecycle.registry().is_empty());
        assert!(!handle.close());

        drop(handle);
        assert_eq!(lifecycle.metrics.snapshot().subscriptions_terminated, 0);
    }

    #[test]
    fn test_reason_round_trip() {
        for reason in [
            TerminationReason::Closed,
            TerminationReason::Timeout,
            TerminationReason::TransportError,
            TerminationReason::DeliveryFailure,
        ] {
            assert_eq!(TerminationReason::from_u8(reason as u8), Some(reason));
        }
        assert_eq!(TerminationReason::from_u8(0), None);
    }

    #[test]
    fn test_activate_registers() {
        let lifecycle = lifecycle();
        let project = Uuid::new_v4();
        let handle = open(&lifecycle, Scope::Project(project));

        assert!(handle.is_active());
        assert_eq!(lifecycle.registry().count_for_project(project), 1);
    }

    #[test]
    fn test_close_then_other_triggers_are_noops() {
        let lifecycle = lifecycle();
        let handle = open(&lifecycle, Scope::Global);

        assert!(handle.close());
        assert!(!handle.timed_out());
        assert!(!handle.transport_failed());
        assert!(!handle.close());

        assert_eq!(handle.termination_reason(), Some(TerminationReason::Closed));
        assert_eq!(lifecycle.registry().count(), 0);
        assert_eq!(lifecycle.metrics.snapshot().subscriptions_terminated, 1);
    }

    #[test]
    fn test_drop_counts_as_transport_error() {
        let lifecycle = lifecycle();
        let user = Uuid::new_v4();
        let handle = open(&lifecycle, Scope::User(user));
        let subscription = Arc::clone(handle.subscription());

        drop(handle);

        assert_eq!(
            subscription.termination_reason(),
            Some(TerminationReason::TransportError)
        );
        assert!(!lifecycle.registry().has_user_partition(user));
    }

    #[test]
    fn test_drop_after_close_keeps_first_reason() {
        let lifecycle = lifecycle();
        let handle = open(&lifecycle, Scope::Global);
        let subscription = Arc::clone(handle.subscription());

        handle.timed_out();
        drop(handle);

        assert_eq!(subscription.termination_reason(), Some(TerminationReason::Timeout));
        assert_eq!(lifecycle.metrics.snapshot().terminated_timeout, 1);
        assert_eq!(lifecycle.metrics.snapshot().terminated_transport_error, 0);
    }
}
