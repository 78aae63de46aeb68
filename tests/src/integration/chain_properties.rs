//! # Chain-State Properties
//!
//! Invariants that must hold over accepted chain state regardless of the
//! submission order: proof-of-work validity, parent presence, idempotent
//! inserts, and finality monotonicity.

#[cfg(test)]
mod tests {
    use crate::support::{build_chain, build_child, launch};
    use fc_consensus::pow;
    use shared_types::{ForkchoiceState, Hash, PayloadStatus};

    /// Every block reachable from the head satisfies `hash <= target`, and
    /// every parent is present back to genesis (no dangling blocks).
    #[tokio::test]
    async fn test_accepted_chain_is_sealed_and_connected() {
        let harness = launch(false);
        let chain = build_chain(&harness.genesis, 5, 8);
        for block in &chain {
            let status = harness.node.engine.submit_block(block.clone()).await.unwrap();
            assert!(status.is_valid(), "unexpected status {status}");
        }
        let tip = chain.last().unwrap().hash();
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: tip,
                ..Default::default()
            })
            .await
            .unwrap();

        // Walk head -> genesis through the status interface.
        let mut current = harness.node.status.current_head().head;
        let genesis_hash = harness.genesis.hash();
        let mut visited = 0u64;
        while current != genesis_hash {
            let block = harness
                .node
                .status
                .block_by_hash(current)
                .await
                .expect("ancestor must be present");
            pow::verify_pow(&block.header).expect("accepted block must carry a valid seal");
            current = block.parent_hash();
            visited += 1;
        }
        assert_eq!(visited, 5);

        harness.node.shutdown().await;
    }

    /// Submitting the same valid block twice succeeds both times and does
    /// not duplicate it in chain state.
    #[tokio::test]
    async fn test_idempotent_insert() {
        let harness = launch(false);
        let block = build_child(&harness.genesis, 8, 1, vec![]);

        let first = harness.node.engine.submit_block(block.clone()).await.unwrap();
        assert_eq!(first, PayloadStatus::Valid);

        let before = harness.node.status.chain_info().await.unwrap();
        let second = harness.node.engine.submit_block(block).await.unwrap();
        assert!(second.is_valid());

        let after = harness.node.status.chain_info().await.unwrap();
        assert_eq!(before.block_count, after.block_count);

        harness.node.shutdown().await;
    }

    /// Once finalized, a later update cannot move `finalized` to a
    /// non-descendant; the attempt is `Invalid` and state is unchanged.
    #[tokio::test]
    async fn test_finalized_pointer_is_monotonic() {
        let harness = launch(false);
        let chain = build_chain(&harness.genesis, 3, 8);
        for block in &chain {
            harness.node.engine.submit_block(block.clone()).await.unwrap();
        }
        let (h1, h3) = (chain[0].hash(), chain[2].hash());

        let status = harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: h3,
                safe: h3,
                finalized: h3,
            })
            .await
            .unwrap();
        assert_eq!(status, PayloadStatus::Valid);

        // Rolling finality back to an ancestor must fail without effect.
        let status = harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: h3,
                safe: h3,
                finalized: h1,
            })
            .await
            .unwrap();
        assert!(matches!(status, PayloadStatus::Invalid { .. }));
        assert_eq!(harness.node.status.current_head().finalized, h3);

        harness.node.shutdown().await;
    }

    /// An unknown finalized hash is rejected outright.
    #[tokio::test]
    async fn test_unknown_finalized_rejected() {
        let harness = launch(false);
        let block = build_child(&harness.genesis, 8, 1, vec![]);
        let hash = block.hash();
        harness.node.engine.submit_block(block).await.unwrap();

        let status = harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: hash,
                safe: Hash::default(),
                finalized: [0xAB; 32],
            })
            .await
            .unwrap();
        assert!(matches!(status, PayloadStatus::Invalid { .. }));

        harness.node.shutdown().await;
    }

    /// A producer that abandons its response slot does not disturb command
    /// processing; the block still lands.
    #[tokio::test]
    async fn test_abandoned_response_still_processed() {
        let harness = launch(false);
        let block = build_child(&harness.genesis, 8, 1, vec![]);
        let hash = block.hash();

        harness
            .node
            .engine
            .submit_block_detached(block)
            .await
            .unwrap();

        // The manager processes the orphaned command; the block is queryable.
        let mut fetched = None;
        for _ in 0..50 {
            fetched = harness.node.status.block_by_hash(hash).await;
            if fetched.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(fetched.is_some(), "abandoned submission must still insert");

        harness.node.shutdown().await;
    }
}
