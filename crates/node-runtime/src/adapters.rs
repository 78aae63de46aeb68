//! Dev adapters for the external capability ports
//!
//! In-process, deterministic implementations of the executor, transaction
//! source, and peer transport. They stand in for the real collaborators in
//! development runs and in the integration test suite; a production node
//! injects its own.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    Block, ExecutionError, ExecutionOutcome, Executor, Hash, Transaction, TransactionSource,
};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;

/// Deterministic executor: every root is a digest of the body and the
/// parent state root.
///
/// Any two nodes running this executor agree on the roots for a given body,
/// which is exactly the property the chain manager's re-verification step
/// needs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevExecutor;

impl DevExecutor {
    /// The outcome this executor will produce for a body — usable by block
    /// builders that need to declare roots before submission.
    pub fn outcome_for(
        body: &[Transaction],
        parent_state_root: Hash,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let encoded = bincode::serialize(body)
            .map_err(|err| ExecutionError::Internal(err.to_string()))?;

        let mut hasher = Keccak256::new();
        hasher.update(parent_state_root);
        hasher.update(&encoded);
        let state_root: Hash = hasher.finalize().into();

        let mut hasher = Keccak256::new();
        hasher.update(state_root);
        hasher.update(b"receipts");
        let receipts_root: Hash = hasher.finalize().into();

        let mut hasher = Keccak256::new();
        hasher.update(state_root);
        hasher.update(b"logs");
        let logs_digest: Hash = hasher.finalize().into();

        Ok(ExecutionOutcome {
            state_root,
            receipts_root,
            logs_digest,
            gas_used: body.iter().map(|tx| tx.gas_limit.min(21_000)).sum(),
        })
    }
}

#[async_trait]
impl Executor for DevExecutor {
    async fn execute(
        &self,
        body: &[Transaction],
        parent_state_root: Hash,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        Self::outcome_for(body, parent_state_root)
    }
}

/// A transaction source serving from a fixed in-memory queue.
#[derive(Debug, Default)]
pub struct StaticTransactionSource {
    pending: Mutex<Vec<Transaction>>,
}

impl StaticTransactionSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue transactions for the next batches.
    pub fn push(&self, transactions: Vec<Transaction>) {
        self.pending.lock().extend(transactions);
    }
}

#[async_trait]
impl TransactionSource for StaticTransactionSource {
    async fn next_batch(&self, max_gas: u64) -> Vec<Transaction> {
        let mut pending = self.pending.lock();
        let mut batch = Vec::new();
        let mut gas = 0u64;
        while let Some(tx) = pending.first() {
            if gas + tx.gas_limit > max_gas {
                break;
            }
            gas += tx.gas_limit;
            batch.push(pending.remove(0));
        }
        batch
    }
}

/// An in-memory peer fabric.
///
/// Blocks registered on the fabric are served to `request_block` /
/// `request_ancestors`; announcements are recorded for inspection. Good
/// enough to exercise the propagation layer without a network.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    blocks: Mutex<HashMap<Hash, Block>>,
    announced: Mutex<Vec<Hash>>,
}

impl LoopbackTransport {
    /// Create an empty fabric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a block available to fetch requests.
    pub fn register_block(&self, block: Block) {
        self.blocks.lock().insert(block.hash(), block);
    }

    /// Hashes announced so far, in order.
    pub fn announced(&self) -> Vec<Hash> {
        self.announced.lock().clone()
    }
}

#[async_trait]
impl fc_propagation::PeerTransport for LoopbackTransport {
    async fn announce(&self, block_hash: Hash) {
        self.announced.lock().push(block_hash);
    }

    async fn request_block(&self, hash: Hash) -> Option<Block> {
        self.blocks.lock().get(&hash).cloned()
    }

    async fn request_ancestors(&self, hash: Hash, depth: u32) -> Vec<Block> {
        let blocks = self.blocks.lock();
        let mut out = Vec::new();
        let mut current = blocks.get(&hash).map(|block| block.parent_hash());
        while let Some(parent_hash) = current {
            if out.len() as u32 >= depth {
                break;
            }
            let Some(parent) = blocks.get(&parent_hash) else {
                break;
            };
            out.push(parent.clone());
            current = Some(parent.parent_hash());
        }
        out
    }
}
