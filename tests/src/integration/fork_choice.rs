//! # Fork Choice and Reorgs
//!
//! The head must always carry the greatest cumulative difficulty, ties must
//! resolve first-seen, and reorgs must be visible through head events with
//! the retired/adopted paths intact.

#[cfg(test)]
mod tests {
    use crate::support::{build_chain, build_child, launch};
    use shared_types::{ForkchoiceState, PayloadStatus, U256};
    use std::time::Duration;
    use tokio::time::timeout;

    /// Parent P has cumulative difficulty 10; A contributes 3 and B
    /// contributes 5. Fork choice run for either candidate selects B
    /// (15 > 13).
    #[tokio::test]
    async fn test_heavier_sibling_becomes_head() {
        let harness = launch(false);
        let a = build_child(&harness.genesis, 3, 0xA, vec![]);
        let b = build_child(&harness.genesis, 5, 0xB, vec![]);
        let (a_hash, b_hash) = (a.hash(), b.hash());

        // Both siblings extend the current head; insertion never moves it.
        assert_eq!(
            harness.node.engine.submit_block(a).await.unwrap(),
            PayloadStatus::Valid
        );
        assert_eq!(
            harness.node.engine.submit_block(b).await.unwrap(),
            PayloadStatus::Valid
        );

        // Fork choice for candidate A still picks B.
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: a_hash,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(harness.node.status.current_head().head, b_hash);

        // And for candidate B, of course, B.
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: b_hash,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(harness.node.status.current_head().head, b_hash);

        let info = harness.node.status.chain_info().await.unwrap();
        assert_eq!(info.cumulative_difficulty, U256::from(15u64));

        harness.node.shutdown().await;
    }

    /// Equal-weight siblings resolve to the first seen, deterministically.
    #[tokio::test]
    async fn test_equal_weight_first_seen_wins() {
        let harness = launch(false);
        let first = build_child(&harness.genesis, 5, 0x01, vec![]);
        let second = build_child(&harness.genesis, 5, 0x02, vec![]);
        let (first_hash, second_hash) = (first.hash(), second.hash());

        harness.node.engine.submit_block(first).await.unwrap();
        harness.node.engine.submit_block(second).await.unwrap();

        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: second_hash,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(harness.node.status.current_head().head, first_hash);

        harness.node.shutdown().await;
    }

    /// A reorg retires the light branch and adopts the heavy one; the head
    /// event reports both paths and the common ancestor.
    #[tokio::test]
    async fn test_reorg_event_carries_paths() {
        let harness = launch(false);
        let mut events = harness.node.head_events.subscribe();

        // Light branch: one block of weight 3.
        let light = build_child(&harness.genesis, 3, 0x11, vec![]);
        let light_hash = light.hash();
        harness.node.engine.submit_block(light).await.unwrap();
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: light_hash,
                ..Default::default()
            })
            .await
            .unwrap();
        let first_event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first_event.new_head, light_hash);
        assert!(!first_event.is_reorg());

        // Heavy branch: two blocks of weight 4 each.
        let heavy = build_chain(&harness.genesis, 2, 4);
        for block in &heavy {
            harness.node.engine.submit_block(block.clone()).await.unwrap();
        }
        let heavy_tip = heavy.last().unwrap().hash();
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: heavy_tip,
                ..Default::default()
            })
            .await
            .unwrap();

        let reorg_event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(reorg_event.is_reorg());
        assert_eq!(reorg_event.new_head, heavy_tip);
        assert_eq!(reorg_event.previous_head, light_hash);
        assert_eq!(reorg_event.common_ancestor, harness.genesis.hash());
        assert_eq!(reorg_event.retired, vec![light_hash]);
        assert_eq!(
            reorg_event.adopted,
            heavy.iter().map(|block| block.hash()).collect::<Vec<_>>()
        );

        harness.node.shutdown().await;
    }

    /// After any sequence of updates the head's cumulative difficulty is
    /// maximal over everything submitted.
    #[tokio::test]
    async fn test_head_weight_is_maximal() {
        let harness = launch(false);

        // Three competing branches of different shapes.
        let branch_a = build_chain(&harness.genesis, 3, 2); // 10 + 6 = 16
        let branch_b = build_chain(&harness.genesis, 1, 9); // 10 + 9 = 19
        let branch_c = build_chain(&harness.genesis, 2, 4); // 10 + 8 = 18

        for block in branch_a.iter().chain(&branch_b).chain(&branch_c) {
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

        assert_eq!(
            harness.node.status.current_head().head,
            branch_b.last().unwrap().hash()
        );
        let info = harness.node.status.chain_info().await.unwrap();
        assert_eq!(info.cumulative_difficulty, U256::from(19u64));

        harness.node.shutdown().await;
    }

    /// A heavier branch that conflicts with finality is never chosen.
    #[tokio::test]
    async fn test_finalized_branch_pinned_through_reorg_pressure() {
        let harness = launch(false);
        let kept = build_chain(&harness.genesis, 2, 4);
        for block in &kept {
            harness.node.engine.submit_block(block.clone()).await.unwrap();
        }
        let kept_tip = kept.last().unwrap().hash();

        // Finalize the first block of the kept branch.
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: kept_tip,
                safe: kept_tip,
                finalized: kept[0].hash(),
            })
            .await
            .unwrap();

        // A much heavier conflicting branch arrives.
        let rival = build_child(&harness.genesis, 100, 0x99, vec![]);
        let rival_hash = rival.hash();
        harness.node.engine.submit_block(rival).await.unwrap();
        harness
            .node
            .engine
            .update_fork_choice(ForkchoiceState {
                head: rival_hash,
                ..Default::default()
            })
            .await
            .unwrap();

        // Finality pins the head to the kept branch.
        assert_eq!(harness.node.status.current_head().head, kept_tip);

        harness.node.shutdown().await;
    }
}
