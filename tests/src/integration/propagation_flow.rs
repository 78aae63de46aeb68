//! # Propagation Flow
//!
//! Peer-facing behavior: head announcements, pre-check filtering of
//! adversarial blocks, and ancestor backfill for unknown-parent
//! announcements.

#[cfg(test)]
mod tests {
    use crate::support::{build_chain, build_child, launch};
    use fc_propagation::PropagationError;
    use shared_types::{Block, ForkchoiceState, PayloadStatus};
    use std::time::Duration;
    use uuid::Uuid;

    /// Every head change is announced to peers in order.
    #[tokio::test]
    async fn test_head_changes_are_announced() {
        let harness = launch(false);
        let chain = build_chain(&harness.genesis, 3, 8);
        for block in &chain {
            harness.node.engine.submit_block(block.clone()).await.unwrap();
            harness
                .node
                .engine
                .update_fork_choice(ForkchoiceState {
                    head: block.hash(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        // The announcer runs on its own task; give it a beat.
        let expected: Vec<_> = chain.iter().map(|block| block.hash()).collect();
        let mut announced = harness.transport.announced();
        for _ in 0..50 {
            if announced.len() >= expected.len() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            announced = harness.transport.announced();
        }
        assert_eq!(announced, expected);

        harness.node.shutdown().await;
    }

    /// A peer block with a known parent imports directly and becomes head.
    #[tokio::test]
    async fn test_peer_block_with_known_parent() {
        let harness = launch(false);
        let block = build_child(&harness.genesis, 8, 1, vec![]);
        let hash = block.hash();

        let status = harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), block)
            .await
            .unwrap();
        assert_eq!(status, PayloadStatus::Valid);
        assert_eq!(harness.node.status.current_head().head, hash);

        harness.node.shutdown().await;
    }

    /// Announcing a block whose ancestors are unknown triggers a bounded
    /// ancestor fetch; the fetched chain is submitted oldest-first and the
    /// announced block ends up canonical.
    #[tokio::test]
    async fn test_unknown_parent_backfills_ancestors() {
        let harness = launch(false);
        let chain = build_chain(&harness.genesis, 4, 8);
        let tip = chain.last().unwrap().clone();
        let tip_hash = tip.hash();

        // Peers know the whole chain; our node only hears about the tip.
        for block in &chain {
            harness.transport.register_block(block.clone());
        }

        let status = harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), tip)
            .await
            .unwrap();
        assert_eq!(status, PayloadStatus::Valid);
        assert_eq!(harness.node.status.current_head().head, tip_hash);

        // Everything back to genesis must now be present.
        for block in &chain {
            assert!(harness
                .node
                .status
                .block_by_hash(block.hash())
                .await
                .is_some());
        }

        harness.node.shutdown().await;
    }

    /// An orphan whose ancestors nobody serves is dropped with a fetch
    /// failure, and chain state is untouched.
    #[tokio::test]
    async fn test_unfetchable_orphan_is_dropped() {
        let harness = launch(false);
        let chain = build_chain(&harness.genesis, 2, 8);
        let orphan = chain.last().unwrap().clone();

        let err = harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), orphan)
            .await
            .unwrap_err();
        assert!(matches!(err, PropagationError::AncestorFetchFailed { .. }));

        let info = harness.node.status.chain_info().await.unwrap();
        assert_eq!(info.block_count, 1);

        harness.node.shutdown().await;
    }

    /// A block with a broken seal never reaches the chain manager: the
    /// pre-check drops it and flags the peer.
    #[tokio::test]
    async fn test_adversarial_block_rejected_by_pre_check() {
        let harness = launch(false);
        let mut block = build_child(&harness.genesis, 8, 1, vec![]);
        block.header.nonce = block.header.nonce.wrapping_add(1);
        let block = Block::new(block.header, vec![]);

        let err = harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), block)
            .await
            .unwrap_err();
        assert!(err.is_peer_fault());

        let info = harness.node.status.chain_info().await.unwrap();
        assert_eq!(info.block_count, 1);

        harness.node.shutdown().await;
    }

    /// Re-announcing an imported block is suppressed by the seen cache.
    #[tokio::test]
    async fn test_duplicate_announcement_suppressed() {
        let harness = launch(false);
        let block = build_child(&harness.genesis, 8, 1, vec![]);

        harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), block.clone())
            .await
            .unwrap();
        let err = harness
            .node
            .importer
            .on_block_announcement(Uuid::new_v4(), block)
            .await
            .unwrap_err();
        assert!(matches!(err, PropagationError::AlreadySeen { .. }));
        // Duplicates are not the peer's fault.
        assert!(!err.is_peer_fault());

        harness.node.shutdown().await;
    }
}
