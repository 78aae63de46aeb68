//! # External Capability Ports
//!
//! Trait contracts for the capabilities this core consumes but does not
//! implement: block execution and transaction supply. Concrete adapters live
//! in the runtime (dev adapters) or outside the workspace entirely.

use crate::entities::{ExecutionOutcome, Hash, Transaction};
use crate::errors::ExecutionError;
use async_trait::async_trait;

/// The external block executor capability.
///
/// Given a block body and the parent's state root, deterministically produce
/// the post-state roots, or fail with an execution error. The chain manager
/// and the block assembler both execute through this port.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a body against the parent state.
    async fn execute(
        &self,
        body: &[Transaction],
        parent_state_root: Hash,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

/// The external transaction source capability.
///
/// Admission policy lives behind this port; the assembler only asks for the
/// next batch that fits under a gas ceiling.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Return an ordered batch of transactions whose combined gas limits fit
    /// under `max_gas`. May be empty.
    async fn next_batch(&self, max_gas: u64) -> Vec<Transaction>;
}
