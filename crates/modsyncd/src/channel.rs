//! Change-notification subscription channels.
//!
//! A [`ChangeChannel`] wraps the subscription to exactly one config
//! topic. The multiplexer parks at most one event per channel in a
//! pending slot when it reports the channel ready; [`ChangeChannel::pop`]
//! then consumes that single event. There is no internal draining loop,
//! so one readiness notification never yields more than one event.

use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tracing::warn;

use modsync_core::ChangeEvent;

/// Default buffer depth for a subscription channel.
pub const CHANNEL_BUFFER: usize = 64;

/// Subscription to one config/notification topic.
pub struct ChangeChannel {
    topic: String,
    rx: mpsc::Receiver<ChangeEvent>,
    pending: Option<ChangeEvent>,
    closed: bool,
}

impl ChangeChannel {
    /// Creates a channel bound to `topic`, fed by `rx`.
    pub fn new(topic: impl Into<String>, rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self {
            topic: topic.into(),
            rx,
            pending: None,
            closed: false,
        }
    }

    /// Topic this channel is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the underlying subscription has gone away.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Takes the event parked by the last readiness notification.
    ///
    /// Valid only immediately after the multiplexer reported this
    /// channel ready; returns `None` otherwise.
    pub fn pop(&mut self) -> Option<ChangeEvent> {
        self.pending.take()
    }

    /// Polls the subscription, parking the next event in the pending slot.
    ///
    /// A closed subscription is logged once and then parks forever; the
    /// multiplexer's timeout still bounds the overall wait.
    pub(crate) fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if self.closed {
            return Poll::Pending;
        }
        if self.pending.is_some() {
            return Poll::Ready(());
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                self.pending = Some(event);
                Poll::Ready(())
            }
            Poll::Ready(None) => {
                warn!(topic = %self.topic, "Change subscription closed; channel excluded from waits");
                self.closed = true;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Creates a subscription channel and the sender that feeds it.
///
/// The sender side belongs to whatever bridges the real store
/// subscription (or a test) into the daemon.
pub fn change_channel(topic: impl Into<String>) -> (mpsc::Sender<ChangeEvent>, ChangeChannel) {
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
    (tx, ChangeChannel::new(topic, rx))
}
