//! Bounded multiplexed wait across change channels.
//!
//! The multiplexer owns every registered [`ChangeChannel`] and offers a
//! single wait primitive: block until one channel has an event, the
//! timeout elapses, or shutdown is requested - whichever comes first.
//! The timeout bound is what keeps shutdown latency finite: the owning
//! loop regains control at least once per interval.

use std::future::poll_fn;
use std::task::Poll;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::channel::ChangeChannel;

/// Result of one multiplexed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The channel at this index has exactly one event parked for `pop()`.
    Ready(usize),

    /// No channel became ready within the timeout.
    Timeout,

    /// Shutdown was requested while waiting.
    Cancelled,
}

/// Waits across any number of registered change channels.
#[derive(Default)]
pub struct EventMultiplexer {
    channels: Vec<ChangeChannel>,
    next_start: usize,
}

impl EventMultiplexer {
    /// Creates a multiplexer with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel and returns its index for dispatch.
    pub fn register(&mut self, channel: ChangeChannel) -> usize {
        self.channels.push(channel);
        self.channels.len() - 1
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Mutable access to a registered channel, for `pop()` after readiness.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut ChangeChannel> {
        self.channels.get_mut(index)
    }

    /// Waits until one channel is ready, the timeout elapses, or
    /// shutdown is requested.
    ///
    /// Never suspends longer than `timeout`. Channel readiness is
    /// polled round-robin so a chatty topic cannot starve the others.
    /// Transport anomalies (a closed subscription) are logged inside
    /// the channel and excluded; they never surface as errors here.
    pub async fn wait(&mut self, timeout: Duration, cancel: &CancellationToken) -> WaitOutcome {
        let channels = &mut self.channels;
        let next_start = &mut self.next_start;

        let ready = poll_fn(|cx| {
            let n = channels.len();
            for offset in 0..n {
                let index = (*next_start + offset) % n;
                if channels[index].poll_event(cx).is_ready() {
                    *next_start = (index + 1) % n;
                    return Poll::Ready(index);
                }
            }
            Poll::Pending
        });

        tokio::select! {
            biased;

            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            index = ready => WaitOutcome::Ready(index),
            _ = tokio::time::sleep(timeout) => WaitOutcome::Timeout,
        }
    }
}
