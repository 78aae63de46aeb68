//! # Head Event Bus
//!
//! Broadcast channel announcing canonical head changes. The chain manager is
//! the only publisher; the miner (restart search on the new parent) and the
//! propagation layer (announce to peers) subscribe.
//!
//! Events are delivered in the order the corresponding fork-choice updates
//! completed. A slow subscriber lags rather than blocking the publisher.

use shared_types::{ForkchoiceState, Hash};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::DEFAULT_EVENT_CAPACITY;

/// Errors from head-event subscriptions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The head event bus was closed.
    #[error("Head event bus closed")]
    Closed,
}

/// A canonical head change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadEvent {
    /// The new canonical tip.
    pub new_head: Hash,
    /// Height of the new tip.
    pub height: u64,
    /// The tip this event replaces.
    pub previous_head: Hash,
    /// Deepest block shared by the old and new branches. Equals
    /// `previous_head` when the head simply advanced.
    pub common_ancestor: Hash,
    /// Blocks leaving the canonical chain, tip first. Empty unless a reorg
    /// occurred.
    pub retired: Vec<Hash>,
    /// Blocks joining the canonical chain, oldest first.
    pub adopted: Vec<Hash>,
    /// Snapshot of the full pointer set after the update.
    pub forkchoice: ForkchoiceState,
}

impl HeadEvent {
    /// Whether this head change retired previously canonical blocks.
    pub fn is_reorg(&self) -> bool {
        !self.retired.is_empty()
    }
}

/// In-memory broadcast bus for head events.
///
/// Uses `tokio::sync::broadcast` for single-publisher, multi-consumer
/// semantics. Suitable for single-node operation.
pub struct HeadEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<HeadEvent>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl HeadEventBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Publish a head event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: HeadEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(receivers = receiver_count, "Head event published");
                receiver_count
            }
            Err(e) => {
                // No receivers - event is dropped
                warn!(error = %e, "Head event dropped (no receivers)");
                0
            }
        }
    }

    /// Subscribe to head events.
    #[must_use]
    pub fn subscribe(&self) -> HeadEvents {
        HeadEvents {
            receiver: self.sender.subscribe(),
        }
    }

    /// Get a stream of head events.
    #[must_use]
    pub fn event_stream(&self) -> HeadEventStream {
        HeadEventStream::new(self.subscribe())
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HeadEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription handle for receiving head events.
pub struct HeadEvents {
    receiver: broadcast::Receiver<HeadEvent>,
}

impl HeadEvents {
    /// Receive the next head event.
    ///
    /// A lagged subscriber skips the overwritten events and keeps receiving;
    /// the miner and the propagation layer only ever care about the most
    /// recent head anyway.
    ///
    /// Returns `None` when the bus is dropped.
    pub async fn recv(&mut self) -> Option<HeadEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Head event subscriber lagged");
                    continue;
                }
            }
        }
    }

    /// Try to receive the next head event without blocking.
    ///
    /// Returns `Ok(None)` when no event is ready.
    pub fn try_recv(&mut self) -> Result<Option<HeadEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }
}

/// A stream wrapper for head event subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct HeadEventStream {
    subscription: HeadEvents,
}

impl HeadEventStream {
    /// Create a new stream from a subscription.
    #[must_use]
    pub fn new(subscription: HeadEvents) -> Self {
        Self { subscription }
    }
}

impl Stream for HeadEventStream {
    type Item = HeadEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                // No event ready, need to wait
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn event(new_head: Hash, height: u64) -> HeadEvent {
        HeadEvent {
            new_head,
            height,
            previous_head: [0u8; 32],
            common_ancestor: [0u8; 32],
            retired: vec![],
            adopted: vec![new_head],
            forkchoice: ForkchoiceState::at(new_head),
        }
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = HeadEventBus::new();
        let receivers = bus.publish(event([1u8; 32], 1));
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = HeadEventBus::new();
        let mut sub = bus.subscribe();

        bus.publish(event([1u8; 32], 1));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(received.new_head, [1u8; 32]);
        assert!(!received.is_reorg());
    }

    #[tokio::test]
    async fn test_delivery_order() {
        let bus = HeadEventBus::new();
        let mut sub = bus.subscribe();

        for height in 1..=5u64 {
            bus.publish(event([height as u8; 32], height));
        }

        for height in 1..=5u64 {
            let received = sub.recv().await.expect("event");
            assert_eq!(received.height, height);
        }
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let bus = HeadEventBus::with_capacity(2);
        let mut sub = bus.subscribe();

        // Overflow the subscriber's buffer.
        for height in 1..=10u64 {
            bus.publish(event([height as u8; 32], height));
        }

        // The subscriber lags, drops the overwritten events, and still
        // observes the most recent ones.
        let received = sub.recv().await.expect("event");
        assert!(received.height >= 8);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = HeadEventBus::new();
        let mut sub = bus.subscribe();
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[test]
    fn test_subscriber_count() {
        let bus = HeadEventBus::new();
        let sub1 = bus.subscribe();
        let sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(sub1);
        drop(sub2);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
