//! Head announcer
//!
//! Relays every canonical head change to connected peers. Fire-and-forget:
//! nothing is awaited from peers and no state is kept.

use crate::ports::PeerTransport;
use shared_bus::HeadEvents;
use std::sync::Arc;
use tracing::{debug, info};

/// Announces new canonical heads to peers.
pub struct Announcer {
    head_events: HeadEvents,
    transport: Arc<dyn PeerTransport>,
}

impl Announcer {
    /// Create an announcer from a head-event subscription.
    pub fn new(head_events: HeadEvents, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            head_events,
            transport,
        }
    }

    /// Run until the head event bus closes.
    pub async fn run(mut self) {
        info!("Announcer started");
        while let Some(event) = self.head_events.recv().await {
            debug!(
                head = %hex::encode(&event.new_head[..8]),
                height = event.height,
                reorg = event.is_reorg(),
                "Announcing new head"
            );
            self.transport.announce(event.new_head).await;
        }
        info!("Head event bus closed, announcer stopping");
    }
}
