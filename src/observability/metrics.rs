//! Metrics registry for the broadcast core
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-free
//!
//! Live connection counts are not tracked here; they are always computed
//! from the connection registry at the moment they are asked for.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::realtime::TerminationReason;

/// Operational counters
///
/// All counters use Relaxed ordering; they are observational only and
/// never drive control flow.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Subscriptions admitted into the registry
    subscriptions_opened: AtomicU64,
    /// Subscriptions terminated, by trigger
    terminated_closed: AtomicU64,
    terminated_timeout: AtomicU64,
    terminated_transport_error: AtomicU64,
    terminated_delivery_failure: AtomicU64,
    /// Subscribe requests refused by the authorization gate
    authorization_denials: AtomicU64,
    /// Subscribe requests for unknown projects
    subscribe_not_found: AtomicU64,
    /// Events handed to publish
    events_published: AtomicU64,
    /// Messages accepted by a sink
    deliveries_succeeded: AtomicU64,
    /// Messages rejected by a sink
    deliveries_failed: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Subscription metrics

    pub fn increment_subscriptions_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a termination under its trigger
    pub fn record_termination(&self, reason: TerminationReason) {
        let counter = match reason {
            TerminationReason::Closed => &self.terminated_closed,
            TerminationReason::Timeout => &self.terminated_timeout,
            TerminationReason::TransportError => &self.terminated_transport_error,
            TerminationReason::DeliveryFailure => &self.terminated_delivery_failure,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_authorization_denials(&self) {
        self.authorization_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_subscribe_not_found(&self) {
        self.subscribe_not_found.fetch_add(1, Ordering::Relaxed);
    }

    // Broadcast metrics

    pub fn increment_events_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deliveries_succeeded(&self) {
        self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deliveries_failed(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let terminated_closed = self.terminated_closed.load(Ordering::Relaxed);
        let terminated_timeout = self.terminated_timeout.load(Ordering::Relaxed);
        let terminated_transport_error = self.terminated_transport_error.load(Ordering::Relaxed);
        let terminated_delivery_failure = self.terminated_delivery_failure.load(Ordering::Relaxed);

        MetricsSnapshot {
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            subscriptions_terminated: terminated_closed
                + terminated_timeout
                + terminated_transport_error
                + terminated_delivery_failure,
            terminated_closed,
            terminated_timeout,
            terminated_transport_error,
            terminated_delivery_failure,
            authorization_denials: self.authorization_denials.load(Ordering::Relaxed),
            subscribe_not_found: self.subscribe_not_found.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub subscriptions_opened: u64,
    pub subscriptions_terminated: u64,
    pub terminated_closed: u64,
    pub terminated_timeout: u64,
    pub terminated_transport_error: u64,
    pub terminated_delivery_failure: u64,
    pub authorization_denials: u64,
    pub subscribe_not_found: u64,
    pub events_published: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();

        assert_eq!(snapshot.subscriptions_opened, 0);
        assert_eq!(snapshot.subscriptions_terminated, 0);
        assert_eq!(snapshot.events_published, 0);
    }

    #[test]
    fn test_terminations_by_reason() {
        let registry = MetricsRegistry::new();

        registry.record_termination(TerminationReason::Closed);
        registry.record_termination(TerminationReason::DeliveryFailure);
        registry.record_termination(TerminationReason::DeliveryFailure);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.terminated_closed, 1);
        assert_eq!(snapshot.terminated_delivery_failure, 2);
        assert_eq!(snapshot.terminated_timeout, 0);
        assert_eq!(snapshot.subscriptions_terminated, 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_events_published();
        registry.increment_deliveries_succeeded();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["events_published"], 1);
        assert_eq!(json["deliveries_succeeded"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_subscriptions_opened();
                    reg.record_termination(TerminationReason::TransportError);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.subscriptions_opened, 1000);
        assert_eq!(snapshot.terminated_transport_error, 1000);
    }
}
