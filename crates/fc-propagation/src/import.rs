//! Import pre-check
//!
//! The cheap filter in front of the engine bus: structural and
//! proof-of-work validation plus duplicate suppression. Blocks failing here
//! never cost the chain manager any of its serialized processing time. The
//! manager re-verifies everything that passes — defense in depth, this
//! filter is not a trust boundary.

use crate::config::PropagationConfig;
use crate::error::{PropagationError, PropagationResult};
use fc_consensus::{BlockValidator, ConsensusConfig};
use parking_lot::Mutex;
use shared_types::{Block, Hash};
use siphasher::sip::SipHasher13;
use std::collections::{HashSet, VecDeque};
use std::hash::Hasher;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Bounded keyed cache of recently seen block hashes.
///
/// Keyed hashing (SipHash-1-3 with a random key) keeps an adversary from
/// grinding block hashes into cache collisions.
struct SeenCache {
    key: (u64, u64),
    entries: HashSet<u64>,
    order: VecDeque<u64>,
    capacity: usize,
}

impl SeenCache {
    fn new(capacity: usize) -> Self {
        Self {
            key: (rand::random(), rand::random()),
            entries: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn digest(&self, hash: &Hash) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(self.key.0, self.key.1);
        hasher.write(hash);
        hasher.finish()
    }

    /// Insert a hash; returns `false` if it was already present.
    fn insert(&mut self, hash: &Hash) -> bool {
        let digest = self.digest(hash);
        if !self.entries.insert(digest) {
            return false;
        }
        self.order.push_back(digest);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        true
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains(&self.digest(hash))
    }
}

/// Pre-validates peer-supplied blocks before they reach the engine bus.
pub struct ImportValidator {
    consensus_config: ConsensusConfig,
    seen: Mutex<SeenCache>,
}

impl ImportValidator {
    /// Create a validator with the given rule set.
    pub fn new(consensus_config: ConsensusConfig, config: &PropagationConfig) -> Self {
        Self {
            consensus_config,
            seen: Mutex::new(SeenCache::new(config.seen_cache_size)),
        }
    }

    /// Run the cheap checks on a peer block.
    ///
    /// Passing blocks are recorded in the seen cache so re-announcements
    /// from other peers are dropped without re-validation.
    pub fn pre_check(&self, block: &Block) -> PropagationResult<()> {
        let hash = block.hash();

        if self.seen.lock().contains(&hash) {
            return Err(PropagationError::AlreadySeen {
                hash: short_hash(&hash),
            });
        }

        BlockValidator::validate_structure(block, &self.consensus_config, now_ms()).map_err(
            |err| PropagationError::RejectedByPreCheck {
                hash: short_hash(&hash),
                reason: err.to_string(),
            },
        )?;

        self.seen.lock().insert(&hash);
        debug!(block = %short_hash(&hash), "Peer block passed pre-check");
        Ok(())
    }

    /// Whether a block hash has already been observed.
    pub fn is_seen(&self, hash: &Hash) -> bool {
        self.seen.lock().contains(hash)
    }

    /// Record a hash without validating (e.g. locally mined blocks that
    /// must not be re-imported when echoed back by peers).
    pub fn mark_seen(&self, hash: &Hash) {
        self.seen.lock().insert(hash);
    }
}

pub(crate) fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
