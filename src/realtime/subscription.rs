//! # Subscriptions
//!
//! One live connection: its identity, scope, state flag and sink.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::event::OutboundMessage;
use super::lifecycle::TerminationReason;
use super::scope::{Principal, Scope, SubscriptionId};
use super::sink::{EventSink, SinkError};

const STATE_ACTIVE: u8 = 0;

/// Lifecycle state of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Terminated(TerminationReason),
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the message
    Delivered,
    /// The subscription was already terminated; nothing was sent
    Skipped,
    /// The sink rejected the message
    Failed(SinkError),
}

/// A live subscriber connection.
///
/// The sink is owned exclusively by the subscription and is only touched
/// under its lock, so at most one message is in flight per connection and a
/// concurrent termination sees either a completed send or none at all.
pub struct Subscription {
    id: SubscriptionId,
    scope: Scope,
    principal: Option<Principal>,
    created_at: DateTime<Utc>,
    state: AtomicU8,
    sink: Mutex<Option<Box<dyn EventSink>>>,
}

impl Subscription {
    /// Create an active subscription around `sink`
    pub fn new(scope: Scope, sink: Box<dyn EventSink>) -> Self {
        Self {
            id: SubscriptionId::new(),
            scope,
            principal: None,
            created_at: Utc::now(),
            state: AtomicU8::new(STATE_ACTIVE),
            sink: Mutex::new(Some(sink)),
        }
    }

    /// Record the principal that opened the subscription
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn principal(&self) -> Option<Principal> {
        self.principal
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time since the subscription was created
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Current state
    pub fn state(&self) -> SubscriptionState {
        match TerminationReason::from_u8(self.state.load(Ordering::SeqCst)) {
            Some(reason) => SubscriptionState::Terminated(reason),
            None => SubscriptionState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_ACTIVE
    }

    /// The trigger that ended this subscription, if any
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        match self.state() {
            SubscriptionState::Active => None,
            SubscriptionState::Terminated(reason) => Some(reason),
        }
    }

    /// Flip Active to Terminated. Only the first caller gets `true`.
    pub(crate) fn mark_terminated(&self, reason: TerminationReason) -> bool {
        self.state
            .compare_exchange(
                STATE_ACTIVE,
                reason as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Drop the sink if no delivery holds it.
    ///
    /// A delivery holding the lock re-checks the state after unlocking and
    /// releases the sink itself.
    pub(crate) fn release_sink(&self) {
        if let Ok(mut sink) = self.sink.try_lock() {
            sink.take();
        }
    }

    /// Push one message through the sink
    pub async fn deliver(&self, message: &OutboundMessage) -> Delivery {
        if !self.is_active() {
            return Delivery::Skipped;
        }

        let outcome = {
            let mut guard = self.sink.lock().await;
            if !self.is_active() {
                guard.take();
                return Delivery::Skipped;
            }
            match guard.as_ref() {
                Some(sink) => match sink.send(message).await {
                    Ok(()) => Delivery::Delivered,
                    Err(e) => Delivery::Failed(e),
                },
                None => Delivery::Skipped,
            }
        };

        if !self.is_active() {
            self.release_sink();
        }

        outcome
    }

    /// Whether the sink has been released
    pub fn sink_released(&self) -> bool {
        match self.sink.try_lock() {
            Ok(sink) => sink.is_none(),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("principal", &self.principal)
            .field("state", &self.state())
            .finish()
    }
}
