//! Error types for the chain manager

use shared_types::{ExecutionError, PayloadStatus};
use thiserror::Error;

/// Result type alias for chain manager operations
pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;

/// Errors that can occur while validating or inserting blocks.
///
/// Every variant except `InternalInvariant` is reported to the submitter as
/// a `PayloadStatus` and never propagates further. `InternalInvariant`
/// implies corrupted chain state and aborts the manager task.
#[derive(Debug, Clone, Error)]
pub enum ConsensusError {
    /// Too many transactions in the body.
    #[error("Too many transactions: {count} > {limit}")]
    TooManyTransactions {
        /// Transactions in the body.
        count: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// Body gas demand exceeds the block gas limit.
    #[error("Gas limit exceeded: used {used}, limit {limit}")]
    GasLimitExceeded {
        /// Gas demanded or used.
        used: u64,
        /// Block gas limit.
        limit: u64,
    },

    /// Extra data field over the cap.
    #[error("Extra data too large: {size} > {limit} bytes")]
    ExtraDataTooLarge {
        /// Actual size.
        size: usize,
        /// Configured cap.
        limit: usize,
    },

    /// Declared difficulty below the chain floor.
    #[error("Difficulty too low: {difficulty} < minimum {minimum}")]
    DifficultyTooLow {
        /// Declared difficulty.
        difficulty: String,
        /// Minimum allowed.
        minimum: String,
    },

    /// The seal hash does not satisfy the declared difficulty target.
    #[error("Invalid proof of work: hash above target")]
    InvalidProofOfWork,

    /// The mix digest does not match the nonce.
    #[error("Invalid proof of work: mix digest mismatch")]
    MixDigestMismatch,

    /// Timestamp too far in the future.
    #[error("Future timestamp: {timestamp} beyond allowed {limit}")]
    FutureTimestamp {
        /// Block timestamp (ms).
        timestamp: u64,
        /// Latest acceptable timestamp (ms).
        limit: u64,
    },

    /// Timestamp earlier than the parent's.
    #[error("Timestamp before parent: block {block} < parent {parent}")]
    TimestampBeforeParent {
        /// Block timestamp (ms).
        block: u64,
        /// Parent timestamp (ms).
        parent: u64,
    },

    /// Height is not parent height + 1.
    #[error("Invalid height: expected {expected}, got {actual}")]
    InvalidHeight {
        /// Expected height.
        expected: u64,
        /// Declared height.
        actual: u64,
    },

    /// Parent hash not present in chain state.
    #[error("Unknown parent: {0}")]
    UnknownParent(String),

    /// Requested fork-choice head not present in chain state.
    #[error("Unknown head: {0}")]
    UnknownHead(String),

    /// A second genesis block was submitted.
    #[error("Genesis block resubmitted on a non-empty chain")]
    GenesisWithParent,

    /// Re-execution produced different roots than the header declares.
    #[error("State transition mismatch for {field}: header {declared}, executed {computed}")]
    RootMismatch {
        /// Which root disagreed (state, receipts, logs, gas).
        field: &'static str,
        /// Hex of the header's value.
        declared: String,
        /// Hex of the recomputed value.
        computed: String,
    },

    /// The executor rejected the body.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Attempted finality rollback or off-chain finalized pointer.
    #[error("Finality violation: {0}")]
    FinalityViolation(String),

    /// Chain state corruption. Fatal to the manager task.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl ConsensusError {
    /// Whether this error implies corrupted state and must abort the
    /// manager task rather than be reported as a status.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InternalInvariant(_))
    }

    /// Whether the submitter can recover by syncing missing ancestors.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownParent(_) | Self::UnknownHead(_))
    }

    /// Map this error to the status reported on the engine bus.
    pub fn to_payload_status(&self) -> PayloadStatus {
        if self.is_recoverable() {
            PayloadStatus::Syncing
        } else {
            PayloadStatus::invalid(self)
        }
    }
}

/// Hex-encode a hash for error messages.
pub(crate) fn short_hash(hash: &shared_types::Hash) -> String {
    hex::encode(&hash[..8])
}
