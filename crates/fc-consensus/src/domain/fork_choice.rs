//! Heaviest-chain fork choice
//!
//! The canonical tip is the block with the greatest cumulative difficulty;
//! ties break toward the earliest insertion (first seen wins). The rule is
//! deterministic and starvation-free under concurrent submissions from the
//! local miner and peers, because the manager's sequential loop assigns
//! every block a unique insertion sequence.

use crate::domain::chain::ChainState;
use crate::error::ConsensusResult;
use shared_types::{Hash, U256};

/// Select the best tip from every block in the arena.
///
/// Any non-tip block is dominated by its descendants (their cumulative
/// difficulty can only be equal or greater, and they were inserted later on
/// a tie only if weightless), so scanning all blocks is equivalent to
/// scanning tips.
pub fn best_tip(state: &ChainState) -> (Hash, U256) {
    let mut best_hash = state.head_hash();
    let mut best_difficulty = U256::zero();
    let mut best_sequence = u64::MAX;

    for (hash, stored) in state.iter_blocks() {
        let better = stored.cumulative_difficulty > best_difficulty
            || (stored.cumulative_difficulty == best_difficulty
                && stored.sequence < best_sequence);
        if better {
            best_hash = *hash;
            best_difficulty = stored.cumulative_difficulty;
            best_sequence = stored.sequence;
        }
    }

    (best_hash, best_difficulty)
}

/// Select the best tip among descendants of `root`.
///
/// Fork choice never considers branches that conflict with finality: the
/// chain manager passes its finalized block as the root, so a heavier but
/// finality-violating branch can never be chosen.
pub fn best_tip_from(state: &ChainState, root: &Hash) -> ConsensusResult<(Hash, U256)> {
    let mut best_hash = *root;
    let mut best_difficulty = U256::zero();
    let mut best_sequence = u64::MAX;

    for (hash, stored) in state.iter_blocks() {
        let better = stored.cumulative_difficulty > best_difficulty
            || (stored.cumulative_difficulty == best_difficulty
                && stored.sequence < best_sequence);
        if better && state.is_ancestor(root, hash)? {
            best_hash = *hash;
            best_difficulty = stored.cumulative_difficulty;
            best_sequence = stored.sequence;
        }
    }

    Ok((best_hash, best_difficulty))
}
