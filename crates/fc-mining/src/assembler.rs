//! Block assembler
//!
//! Turns a solved candidate plus pending transactions into a complete,
//! self-consistent block. The executor produces the state, receipts, and
//! logs roots; the assembler never retries — retry policy belongs to the
//! miner task.

use crate::error::MiningResult;
use shared_types::{
    compute_transactions_root, Block, BlockHeader, CandidateHeader, Executor, Hash,
    TransactionSource,
};
use std::sync::Arc;
use tracing::debug;

/// Assembles complete blocks from solved candidates.
pub struct BlockAssembler {
    executor: Arc<dyn Executor>,
    tx_source: Arc<dyn TransactionSource>,
    gas_limit: u64,
}

impl BlockAssembler {
    /// Create a new assembler.
    pub fn new(
        executor: Arc<dyn Executor>,
        tx_source: Arc<dyn TransactionSource>,
        gas_limit: u64,
    ) -> Self {
        Self {
            executor,
            tx_source,
            gas_limit,
        }
    }

    /// Assemble a block from a solved candidate.
    ///
    /// Consumes the candidate: a candidate is sealed against exactly one
    /// body-independent seal hash and is used exactly once. Executor
    /// failures propagate; the candidate is lost and the caller resumes
    /// searching on the same parent.
    pub async fn assemble(
        &self,
        candidate: CandidateHeader,
        parent_state_root: Hash,
    ) -> MiningResult<Block> {
        let transactions = self.tx_source.next_batch(self.gas_limit).await;
        let outcome = self
            .executor
            .execute(&transactions, parent_state_root)
            .await?;

        debug!(
            height = candidate.height,
            transactions = transactions.len(),
            gas_used = outcome.gas_used,
            "Block assembled"
        );

        let header = BlockHeader {
            parent_hash: candidate.parent_hash,
            height: candidate.height,
            timestamp: candidate.timestamp,
            beneficiary: candidate.beneficiary,
            difficulty: candidate.difficulty,
            extra_data: candidate.extra_data,
            nonce: candidate.nonce,
            mix_digest: candidate.mix_digest,
            state_root: outcome.state_root,
            transactions_root: compute_transactions_root(&transactions),
            receipts_root: outcome.receipts_root,
            logs_digest: outcome.logs_digest,
            gas_used: outcome.gas_used,
            gas_limit: self.gas_limit,
        };

        Ok(Block::new(header, transactions))
    }
}
