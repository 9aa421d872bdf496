//! # Delivery Sinks
//!
//! The per-connection channel a subscription pushes messages into.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::event::OutboundMessage;

/// Why a single send did not reach the connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The receiving side is gone
    #[error("Sink closed")]
    Closed,

    /// The connection is not draining its buffer
    #[error("Sink buffer full")]
    Saturated,

    /// The transport reported a write failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A delivery channel owned by exactly one subscription.
///
/// Each call pushes one message and reports whether it was accepted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SinkError>;
}

/// Sink backed by a bounded tokio channel.
///
/// Sends never wait: a full buffer counts as a failed delivery so a stalled
/// reader cannot hold up the publisher.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport drains
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        self.tx.try_send(message.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Saturated,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}
