//! Peer transport port
//!
//! The logical message contract with the peer network. Wire framing,
//! discovery, and handshakes live in an external transport; this core only
//! sees announcements and block fetches.

use async_trait::async_trait;
use shared_types::{Block, Hash};

/// Identifier of a connected peer.
pub type PeerId = uuid::Uuid;

/// Outbound interface to the peer network.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Announce a block hash to all connected peers. Fire-and-forget; no
    /// response is awaited.
    async fn announce(&self, block_hash: Hash);

    /// Request a single block from the network.
    async fn request_block(&self, hash: Hash) -> Option<Block>;

    /// Request the ancestor chain of `hash`, starting with its parent and
    /// walking backwards, up to `depth` blocks. Returned newest-first; may
    /// be shorter than `depth` if peers know less.
    async fn request_ancestors(&self, hash: Hash, depth: u32) -> Vec<Block>;
}
