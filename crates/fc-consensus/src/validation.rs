//! Stateless and parent-relative block validation
//!
//! The cheap checks shared by the chain manager (step one of submission)
//! and the import validator's fast-path filter. Everything here is pure:
//! callers supply the clock reading and the parent header.

use crate::config::ConsensusConfig;
use crate::domain::pow;
use crate::error::{ConsensusError, ConsensusResult};
use shared_types::{Block, BlockHeader, MAX_EXTRA_DATA_LEN};

/// Stateless validation logic for blocks.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate block structure: field caps, gas accounting, difficulty
    /// floor, and the proof-of-work seal.
    pub fn validate_structure(
        block: &Block,
        config: &ConsensusConfig,
        now_ms: u64,
    ) -> ConsensusResult<()> {
        let header = &block.header;

        if block.transactions.len() > config.max_txs_per_block {
            return Err(ConsensusError::TooManyTransactions {
                count: block.transactions.len(),
                limit: config.max_txs_per_block,
            });
        }

        if header.extra_data.len() > MAX_EXTRA_DATA_LEN {
            return Err(ConsensusError::ExtraDataTooLarge {
                size: header.extra_data.len(),
                limit: MAX_EXTRA_DATA_LEN,
            });
        }

        if header.gas_limit > config.gas_limit {
            return Err(ConsensusError::GasLimitExceeded {
                used: header.gas_limit,
                limit: config.gas_limit,
            });
        }

        if header.gas_used > header.gas_limit {
            return Err(ConsensusError::GasLimitExceeded {
                used: header.gas_used,
                limit: header.gas_limit,
            });
        }

        // The gas the body can demand is bounded before execution is ever
        // attempted; an adversarial body must be cheap to reject.
        let demanded: u64 = block
            .transactions
            .iter()
            .map(|tx| tx.gas_limit)
            .sum();
        if demanded > header.gas_limit {
            return Err(ConsensusError::GasLimitExceeded {
                used: demanded,
                limit: header.gas_limit,
            });
        }

        let transactions_root = shared_types::compute_transactions_root(&block.transactions);
        if transactions_root != header.transactions_root {
            return Err(ConsensusError::RootMismatch {
                field: "transactions_root",
                declared: hex::encode(header.transactions_root),
                computed: hex::encode(transactions_root),
            });
        }

        let limit = now_ms.saturating_add(config.max_future_drift_ms);
        if header.timestamp > limit {
            return Err(ConsensusError::FutureTimestamp {
                timestamp: header.timestamp,
                limit,
            });
        }

        if header.difficulty < config.min_difficulty {
            return Err(ConsensusError::DifficultyTooLow {
                difficulty: header.difficulty.to_string(),
                minimum: config.min_difficulty.to_string(),
            });
        }

        pow::verify_pow(header)
    }

    /// Validate a header against its (already known) parent.
    pub fn validate_against_parent(
        header: &BlockHeader,
        parent: &BlockHeader,
    ) -> ConsensusResult<()> {
        let expected = parent.height + 1;
        if header.height != expected {
            return Err(ConsensusError::InvalidHeight {
                expected,
                actual: header.height,
            });
        }

        if header.timestamp < parent.timestamp {
            return Err(ConsensusError::TimestampBeforeParent {
                block: header.timestamp,
                parent: parent.timestamp,
            });
        }

        Ok(())
    }
}
