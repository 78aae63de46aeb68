//! # Core Chain Entities
//!
//! Defines the entities that flow between the mining, engine, and
//! propagation subsystems.
//!
//! ## Clusters
//!
//! - **Sealing**: `CandidateHeader` (solved proof-of-work, pre-assembly)
//! - **Chain**: `BlockHeader`, `Block`, `Transaction`
//! - **Engine**: `ForkchoiceState`, `PayloadStatus`, `ExecutionOutcome`

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::sync::OnceLock;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Convert a difficulty value into the proof-of-work target ceiling.
///
/// A hash is a valid seal iff `hash <= target`. Difficulty zero maps to the
/// maximum target so that test chains with trivial difficulty always pass.
pub fn difficulty_to_target(difficulty: U256) -> U256 {
    if difficulty.is_zero() {
        return U256::MAX;
    }
    U256::MAX / difficulty
}

// =============================================================================
// CLUSTER A: SEALING
// =============================================================================

/// A header candidate produced by the worker pool.
///
/// Carries everything the proof-of-work seal commits to, plus the winning
/// nonce and mix digest once solved. Immutable after solving; consumed
/// exactly once by the block assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CandidateHeader {
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Height of this block (parent height + 1).
    pub height: u64,
    /// Milliseconds since epoch at template creation.
    pub timestamp: u64,
    /// Miner address receiving the block reward.
    pub beneficiary: Address,
    /// Difficulty the seal was searched against.
    pub difficulty: U256,
    /// Miner-supplied extra data (capped at [`MAX_EXTRA_DATA_LEN`]).
    pub extra_data: Vec<u8>,
    /// The winning nonce.
    pub nonce: u64,
    /// Mix digest binding the nonce to the seal hash.
    pub mix_digest: Hash,
}

/// Maximum length of the miner-supplied extra data field.
pub const MAX_EXTRA_DATA_LEN: usize = 32;

impl CandidateHeader {
    /// Compute the seal hash: the digest the nonce search runs against.
    ///
    /// Commits to every candidate field except `nonce` and `mix_digest`.
    pub fn seal_hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.parent_hash);
        hasher.update(self.beneficiary);
        let mut difficulty_bytes = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty_bytes);
        hasher.update(difficulty_bytes);
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(&self.extra_data);
        hasher.finalize().into()
    }

    /// The proof-of-work target ceiling for this candidate's difficulty.
    pub fn target(&self) -> U256 {
        difficulty_to_target(self.difficulty)
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// A complete block header.
///
/// Extends the candidate fields with the roots produced by execution and the
/// gas accounting for the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Height of this block.
    pub height: u64,
    /// Milliseconds since epoch.
    pub timestamp: u64,
    /// Miner address receiving the block reward.
    pub beneficiary: Address,
    /// Difficulty the seal was searched against.
    pub difficulty: U256,
    /// Miner-supplied extra data.
    pub extra_data: Vec<u8>,
    /// The winning nonce.
    pub nonce: u64,
    /// Mix digest binding the nonce to the seal hash.
    pub mix_digest: Hash,
    /// Root hash of the state trie after applying this block.
    pub state_root: Hash,
    /// Root of the transactions in this block.
    pub transactions_root: Hash,
    /// Root of the execution receipts.
    pub receipts_root: Hash,
    /// Digest of the logs emitted by execution.
    pub logs_digest: Hash,
    /// Gas consumed by the body.
    pub gas_used: u64,
    /// Gas ceiling for the body.
    pub gas_limit: u64,
}

impl BlockHeader {
    /// Compute the block hash over every header field.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.parent_hash);
        hasher.update(self.beneficiary);
        let mut difficulty_bytes = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty_bytes);
        hasher.update(difficulty_bytes);
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(&self.extra_data);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.mix_digest);
        hasher.update(self.state_root);
        hasher.update(self.transactions_root);
        hasher.update(self.receipts_root);
        hasher.update(self.logs_digest);
        hasher.update(self.gas_used.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        hasher.finalize().into()
    }

    /// The seal hash this header's nonce was searched against.
    ///
    /// Must match [`CandidateHeader::seal_hash`] for the same fields so the
    /// import validator can verify proof-of-work without the candidate.
    pub fn seal_hash(&self) -> Hash {
        self.candidate().seal_hash()
    }

    /// The proof-of-work target ceiling for this header's difficulty.
    pub fn target(&self) -> U256 {
        difficulty_to_target(self.difficulty)
    }

    /// Extract the candidate view of this header.
    pub fn candidate(&self) -> CandidateHeader {
        CandidateHeader {
            parent_hash: self.parent_hash,
            height: self.height,
            timestamp: self.timestamp,
            beneficiary: self.beneficiary,
            difficulty: self.difficulty,
            extra_data: self.extra_data.clone(),
            nonce: self.nonce,
            mix_digest: self.mix_digest,
        }
    }

    /// Whether this is the genesis header (height zero, zero parent).
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.parent_hash == Hash::default()
    }
}

/// A transaction as handed over by the external transaction source.
///
/// Admission policy and signature verification are external; by the time a
/// transaction reaches this core it is assumed well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub from: Address,
    /// Recipient address (`None` for contract creation).
    pub to: Option<Address>,
    /// Transaction value in base units.
    pub value: U256,
    /// Sender's nonce.
    pub nonce: u64,
    /// Gas price in base units.
    pub gas_price: U256,
    /// Gas limit for this transaction.
    pub gas_limit: u64,
    /// Transaction payload.
    pub data: Vec<u8>,
}

impl Transaction {
    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        use sha2::{Digest as Sha2Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.from);
        if let Some(to) = &self.to {
            hasher.update(to);
        }
        let mut value_bytes = [0u8; 32];
        self.value.to_big_endian(&mut value_bytes);
        hasher.update(value_bytes);
        hasher.update(self.nonce.to_le_bytes());
        let mut gas_price_bytes = [0u8; 32];
        self.gas_price.to_big_endian(&mut gas_price_bytes);
        hasher.update(gas_price_bytes);
        hasher.update(self.gas_limit.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }
}

/// Compute the transactions root for a body: Keccak over the transaction
/// hashes in order. An empty body has the zero root.
pub fn compute_transactions_root(transactions: &[Transaction]) -> Hash {
    if transactions.is_empty() {
        return Hash::default();
    }
    let mut hasher = Keccak256::new();
    for tx in transactions {
        hasher.update(tx.hash());
    }
    hasher.finalize().into()
}

/// A complete block: header plus body, with the derived hash cached.
///
/// Owned by whichever component currently holds it and transferred by move;
/// never concurrently mutated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// All transactions in this block.
    pub transactions: Vec<Transaction>,
    /// Cached block hash (computed on first access).
    #[serde(skip)]
    hash_cache: OnceLock<Hash>,
}

impl Block {
    /// Create a block from a header and body.
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            hash_cache: OnceLock::new(),
        }
    }

    /// The block hash, cached after the first computation.
    pub fn hash(&self) -> Hash {
        *self.hash_cache.get_or_init(|| self.header.hash())
    }

    /// Height of this block.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Parent hash of this block.
    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.transactions == other.transactions
    }
}

impl Eq for Block {}

// =============================================================================
// CLUSTER C: ENGINE
// =============================================================================

/// The chain manager's externally visible pointer set.
///
/// Mutated only by the chain manager; every other component receives
/// immutable copies via notifications or snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ForkchoiceState {
    /// The canonical chain tip.
    pub head: Hash,
    /// A recent block unlikely to be reorged.
    pub safe: Hash,
    /// The most recent irreversible block.
    pub finalized: Hash,
}

impl ForkchoiceState {
    /// A forkchoice state pointing all three pointers at one block.
    pub fn at(hash: Hash) -> Self {
        Self {
            head: hash,
            safe: hash,
            finalized: hash,
        }
    }
}

/// Status reply for an engine command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadStatus {
    /// The block was inserted on (or the head moved along) the canonical chain.
    Valid,
    /// The input was rejected; state is unchanged.
    Invalid {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// A referenced ancestor is unknown; fetch it and retry.
    Syncing,
    /// The block was inserted on a side chain with resolvable ancestry.
    Accepted,
}

impl PayloadStatus {
    /// Construct an `Invalid` status from anything displayable.
    pub fn invalid(reason: impl fmt::Display) -> Self {
        Self::Invalid {
            reason: reason.to_string(),
        }
    }

    /// Whether the command succeeded (block inserted or head updated).
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid | Self::Accepted)
    }

    /// Whether the submitter should sync missing ancestors and retry.
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }
}

impl fmt::Display for PayloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid { reason } => write!(f, "invalid: {reason}"),
            Self::Syncing => write!(f, "syncing"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

/// Result of executing a block body against its parent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutionOutcome {
    /// Root of the state trie after execution.
    pub state_root: Hash,
    /// Root of the execution receipts.
    pub receipts_root: Hash,
    /// Digest of the logs emitted by execution.
    pub logs_digest: Hash,
    /// Total gas consumed.
    pub gas_used: u64,
}
