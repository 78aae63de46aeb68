//! Configuration for the chain manager

use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Consensus rules and validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Maximum transactions per block body.
    pub max_txs_per_block: usize,

    /// Block gas limit.
    pub gas_limit: u64,

    /// Minimum difficulty any block may declare.
    pub min_difficulty: U256,

    /// How far (ms) a block timestamp may run ahead of local time.
    pub max_future_drift_ms: u64,

    /// Target time between blocks (ms), used by difficulty retargeting.
    pub target_block_time_ms: u64,

    /// Maximum retarget step per block, as a fraction (0.25 = 25%).
    pub max_difficulty_adjustment: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_txs_per_block: 10_000,
            gas_limit: 30_000_000,
            min_difficulty: U256::from(1u64 << 12),
            max_future_drift_ms: 15_000,
            target_block_time_ms: 4_000,
            max_difficulty_adjustment: 0.25,
        }
    }
}

/// Parameters of the genesis block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Genesis timestamp (ms since epoch).
    pub timestamp: u64,

    /// Genesis difficulty; also the starting difficulty of the chain.
    pub difficulty: U256,

    /// Beneficiary recorded in the genesis header.
    pub beneficiary: Address,

    /// Extra data recorded in the genesis header.
    pub extra_data: Vec<u8>,

    /// Gas limit recorded in the genesis header.
    pub gas_limit: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            timestamp: 0,
            difficulty: U256::from(1u64 << 12),
            beneficiary: Address::default(),
            extra_data: b"forgechain".to_vec(),
            gas_limit: 30_000_000,
        }
    }
}
