//! Genesis block construction

use crate::config::GenesisConfig;
use shared_types::{Block, BlockHeader, Hash};

/// Build the genesis block from its configuration.
///
/// Genesis carries no proof-of-work seal (zero nonce and mix digest) and an
/// all-zero parent hash; validation special-cases it and it is never
/// submitted over the engine bus.
pub fn build_genesis(config: &GenesisConfig) -> Block {
    Block::new(
        BlockHeader {
            parent_hash: Hash::default(),
            height: 0,
            timestamp: config.timestamp,
            beneficiary: config.beneficiary,
            difficulty: config.difficulty,
            extra_data: config.extra_data.clone(),
            nonce: 0,
            mix_digest: Hash::default(),
            state_root: Hash::default(),
            transactions_root: Hash::default(),
            receipts_root: Hash::default(),
            logs_digest: Hash::default(),
            gas_used: 0,
            gas_limit: config.gas_limit,
        },
        vec![],
    )
}
