//! Error types for block production

use shared_types::ExecutionError;
use thiserror::Error;

/// Result type alias for block production operations
pub type MiningResult<T> = std::result::Result<T, MiningError>;

/// Errors that can occur during mining and assembly.
#[derive(Debug, Clone, Error)]
pub enum MiningError {
    /// The search was cancelled (head change or shutdown).
    #[error("Mining cancelled")]
    Cancelled,

    /// Every shard exhausted its nonce range without a solution.
    #[error("Nonce space exhausted without a solution")]
    NonceSpaceExhausted,

    /// The executor rejected the assembled body; the candidate is discarded
    /// and the caller resumes searching on the same parent.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The engine command bus is gone.
    #[error("Engine command bus closed")]
    EngineClosed,
}

impl MiningError {
    /// Whether the miner should keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::EngineClosed)
    }
}
