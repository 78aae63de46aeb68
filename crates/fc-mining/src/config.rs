//! Configuration for block production

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Mining configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Number of search threads.
    pub threads: usize,

    /// Nonces to try per shard before checking for cancellation. Bounds the
    /// work wasted after a head change.
    pub batch_size: u64,

    /// Miner address to receive block rewards.
    pub beneficiary: Address,

    /// Extra data stamped into mined headers.
    pub extra_data: Vec<u8>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            batch_size: 10_000,
            beneficiary: Address::default(),
            extra_data: b"forgechain".to_vec(),
        }
    }
}

impl MiningConfig {
    /// Config for single-threaded mining.
    pub fn single_thread() -> Self {
        Self {
            threads: 1,
            ..Default::default()
        }
    }

    /// Config with a specific thread count.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            ..Default::default()
        }
    }
}
