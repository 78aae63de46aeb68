//! Peer block importer
//!
//! Drives announced blocks through the engine bus. A block whose parent is
//! unknown triggers a bounded-depth ancestor fetch; the fetched chain is
//! submitted oldest-first before the announced block is retried, so the
//! manager never sees a child before its parent.

use crate::config::PropagationConfig;
use crate::error::{PropagationError, PropagationResult};
use crate::import::{short_hash, ImportValidator};
use crate::ports::{PeerId, PeerTransport};
use shared_bus::EngineHandle;
use shared_types::{Block, PayloadStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Imports peer-announced blocks into the chain manager.
pub struct PeerImporter {
    validator: Arc<ImportValidator>,
    engine: EngineHandle,
    transport: Arc<dyn PeerTransport>,
    config: PropagationConfig,
}

impl PeerImporter {
    /// Create an importer.
    pub fn new(
        validator: Arc<ImportValidator>,
        engine: EngineHandle,
        transport: Arc<dyn PeerTransport>,
        config: PropagationConfig,
    ) -> Self {
        Self {
            validator,
            engine,
            transport,
            config,
        }
    }

    /// Handle a block announced by a peer.
    ///
    /// On success the block is in chain state and fork choice has been run
    /// for it. Errors carry the peer-penalty signal via
    /// [`PropagationError::is_peer_fault`]; acting on it is external policy.
    pub async fn on_block_announcement(
        &self,
        peer: PeerId,
        block: Block,
    ) -> PropagationResult<PayloadStatus> {
        let hash = block.hash();
        debug!(peer = %peer, block = %short_hash(&hash), "Peer announced block");

        self.validator.pre_check(&block)?;

        let status = self.engine.submit_block(block.clone()).await?;
        let status = match status {
            PayloadStatus::Syncing => {
                debug!(
                    peer = %peer,
                    block = %short_hash(&hash),
                    "Parent unknown, backfilling ancestors"
                );
                self.backfill_ancestors(&block).await?;
                self.engine.submit_block(block).await?
            }
            other => other,
        };

        match status {
            PayloadStatus::Valid | PayloadStatus::Accepted => {}
            PayloadStatus::Invalid { reason } => {
                return Err(PropagationError::RejectedByManager {
                    hash: short_hash(&hash),
                    reason,
                });
            }
            PayloadStatus::Syncing => {
                // Backfill ran and the parent is still missing.
                return Err(PropagationError::DepthExceeded {
                    hash: short_hash(&hash),
                    depth: self.config.max_ancestor_depth,
                });
            }
        }

        // Let fork choice weigh the imported tip.
        let fork_choice = self
            .engine
            .update_fork_choice(shared_types::ForkchoiceState {
                head: hash,
                ..Default::default()
            })
            .await?;

        info!(
            peer = %peer,
            block = %short_hash(&hash),
            fork_choice = %fork_choice,
            "Peer block imported"
        );
        Ok(fork_choice)
    }

    /// Fetch and submit the missing ancestor chain of `block`, oldest first.
    async fn backfill_ancestors(&self, block: &Block) -> PropagationResult<()> {
        let hash = block.hash();
        let ancestors = self
            .transport
            .request_ancestors(hash, self.config.max_ancestor_depth)
            .await;
        if ancestors.is_empty() {
            return Err(PropagationError::AncestorFetchFailed {
                hash: short_hash(&hash),
            });
        }

        debug!(
            block = %short_hash(&hash),
            fetched = ancestors.len(),
            "Submitting fetched ancestors"
        );

        // The transport returns newest-first; the manager needs parents
        // before children.
        for ancestor in ancestors.into_iter().rev() {
            let ancestor_hash = ancestor.hash();
            match self.engine.submit_block(ancestor).await? {
                PayloadStatus::Valid | PayloadStatus::Accepted => {}
                PayloadStatus::Syncing => {
                    return Err(PropagationError::DepthExceeded {
                        hash: short_hash(&hash),
                        depth: self.config.max_ancestor_depth,
                    });
                }
                PayloadStatus::Invalid { reason } => {
                    warn!(
                        ancestor = %short_hash(&ancestor_hash),
                        reason,
                        "Fetched ancestor rejected"
                    );
                    return Err(PropagationError::RejectedByManager {
                        hash: short_hash(&ancestor_hash),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }
}
