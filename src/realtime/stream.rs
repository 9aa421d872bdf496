//! # Subscription Streams
//!
//! Transport-facing view of a channel-backed subscription.
//!
//! The stream yields every message the subscription's sink accepted and
//! ends once the subscription is terminated. It also wires two of the
//! external termination triggers: an elapsed lifetime fires `Timeout`, and
//! dropping the stream early (client went away) fires `TransportError`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};

use super::event::OutboundMessage;
use super::lifecycle::SubscriptionHandle;

/// Messages for one subscription, ending at termination
#[derive(Debug)]
pub struct SubscriptionStream {
    handle: SubscriptionHandle,
    events: mpsc::Receiver<OutboundMessage>,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl SubscriptionStream {
    pub fn new(
        handle: SubscriptionHandle,
        events: mpsc::Receiver<OutboundMessage>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            handle,
            events,
            deadline: timeout.map(|t| Box::pin(sleep(t))),
        }
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}

impl Stream for SubscriptionStream {
    type Item = OutboundMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if let Some(deadline) = this.deadline.as_mut() {
            if deadline.as_mut().poll(cx).is_ready() {
                this.deadline = None;
                this.handle.timed_out();
                this.events.close();
                return Poll::Ready(None);
            }
        }

        this.events.poll_recv(cx)
    }
}
