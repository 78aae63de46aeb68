//! Block template for mining
//!
//! A template carries the fields the proof-of-work seal commits to. The
//! nonce and mix digest are found by the worker pool; the roots and gas
//! accounting are filled in by the assembler after the seal is solved.

use shared_types::{Address, BlockHeader, CandidateHeader, Hash, U256};

/// The sealable fields of the next block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    /// Parent block hash.
    pub parent_hash: Hash,
    /// Block height (parent height + 1).
    pub height: u64,
    /// Timestamp (milliseconds since epoch).
    pub timestamp: u64,
    /// Miner address (coinbase).
    pub beneficiary: Address,
    /// Difficulty the search runs against.
    pub difficulty: U256,
    /// Extra data stamped into the header.
    pub extra_data: Vec<u8>,
}

impl BlockTemplate {
    /// Build a template extending `parent`.
    pub fn on_parent(
        parent: &BlockHeader,
        timestamp: u64,
        difficulty: U256,
        beneficiary: Address,
        extra_data: Vec<u8>,
    ) -> Self {
        Self {
            parent_hash: parent.hash(),
            height: parent.height + 1,
            timestamp,
            beneficiary,
            difficulty,
            extra_data,
        }
    }

    /// The unsealed candidate for this template (zero nonce and mix digest).
    pub fn candidate(&self) -> CandidateHeader {
        CandidateHeader {
            parent_hash: self.parent_hash,
            height: self.height,
            timestamp: self.timestamp,
            beneficiary: self.beneficiary,
            difficulty: self.difficulty,
            extra_data: self.extra_data.clone(),
            nonce: 0,
            mix_digest: Hash::default(),
        }
    }

    /// The seal hash the nonce search runs against.
    pub fn seal_hash(&self) -> Hash {
        self.candidate().seal_hash()
    }

    /// The target value for this template's difficulty.
    pub fn target(&self) -> U256 {
        shared_types::difficulty_to_target(self.difficulty)
    }
}
