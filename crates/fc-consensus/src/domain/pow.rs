//! Proof-of-work sealing and verification
//!
//! The seal is a two-round Keccak construction: the first round binds the
//! nonce to the seal hash, the second produces the mix digest that lets a
//! verifier confirm the nonce without re-running the search. A header is
//! validly sealed when its mix digest matches and the final hash, read as a
//! big-endian integer, is at or below the difficulty target.

use crate::error::ConsensusError;
use shared_types::{difficulty_to_target, BlockHeader, Hash, U256};
use sha3::{Digest, Keccak256};

/// Output of hashing one nonce against a seal hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowOutput {
    /// The final hash compared against the target.
    pub hash: Hash,
    /// Mix digest for verification.
    pub mix_digest: Hash,
}

/// Compute the proof-of-work hash for a (seal hash, nonce) pair.
pub fn pow_hash(seal_hash: &Hash, nonce: u64) -> PowOutput {
    // Round 1: bind the nonce to the seal
    let mut hasher = Keccak256::new();
    hasher.update(seal_hash);
    hasher.update(nonce.to_le_bytes());
    let inner: Hash = hasher.finalize().into();

    // Round 2: mix digest
    let mut hasher = Keccak256::new();
    hasher.update(inner);
    hasher.update(seal_hash);
    let mix_digest: Hash = hasher.finalize().into();

    // Final hash
    let mut hasher = Keccak256::new();
    hasher.update(inner);
    hasher.update(mix_digest);
    let hash: Hash = hasher.finalize().into();

    PowOutput { hash, mix_digest }
}

/// Whether a pow hash satisfies a difficulty target.
pub fn meets_target(hash: &Hash, target: U256) -> bool {
    U256::from_big_endian(hash) <= target
}

/// Verify the proof-of-work seal on a complete header.
///
/// Checks the mix digest first (cheap equality) and the target threshold
/// second; both must hold.
pub fn verify_pow(header: &BlockHeader) -> Result<(), ConsensusError> {
    let seal_hash = header.seal_hash();
    let result = pow_hash(&seal_hash, header.nonce);

    if result.mix_digest != header.mix_digest {
        return Err(ConsensusError::MixDigestMismatch);
    }

    let target = difficulty_to_target(header.difficulty);
    if !meets_target(&result.hash, target) {
        return Err(ConsensusError::InvalidProofOfWork);
    }

    Ok(())
}
