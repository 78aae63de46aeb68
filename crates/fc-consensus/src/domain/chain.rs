//! Chain state arena
//!
//! A single owned store of every known block, indexed by hash, with a
//! height index over the canonical branch and a head pointer. The chain
//! manager task is the only writer; everything else sees copies.

use crate::error::{short_hash, ConsensusError, ConsensusResult};
use shared_types::{Block, BlockHeader, Hash, U256};
use std::collections::HashMap;

/// A block plus the chain-local bookkeeping the manager needs.
#[derive(Debug, Clone)]
pub struct StoredBlock {
    /// The block itself.
    pub block: Block,
    /// Total difficulty of the chain ending at this block.
    pub cumulative_difficulty: U256,
    /// Insertion order, used as the first-seen fork-choice tie-break.
    pub sequence: u64,
    /// Whether this block is on the canonical branch.
    pub canonical: bool,
}

/// Outcome of inserting a block into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Newly inserted. `extends_head` is set when the parent was the
    /// canonical head at insertion time.
    Inserted {
        /// Parent was the canonical head.
        extends_head: bool,
    },
    /// The hash was already present; nothing changed.
    AlreadyKnown {
        /// Current canonical standing of the existing block.
        canonical: bool,
    },
}

/// The paths involved in moving the head to a new tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorgPaths {
    /// Deepest block shared by the old and new branches.
    pub ancestor: Hash,
    /// Blocks leaving the canonical chain, tip first.
    pub retired: Vec<Hash>,
    /// Blocks joining the canonical chain, oldest first.
    pub adopted: Vec<Hash>,
}

/// Summary of the chain for status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Canonical head hash.
    pub head: Hash,
    /// Canonical head height.
    pub height: u64,
    /// Total blocks known (canonical and side chains).
    pub block_count: usize,
    /// Cumulative difficulty of the head.
    pub cumulative_difficulty: U256,
}

/// Mapping from block hash to stored block plus the canonical height index.
///
/// Every block except genesis has its parent present (insertion enforces
/// this), so ancestor walks never dangle; a missing link mid-walk is state
/// corruption and reported as such.
pub struct ChainState {
    blocks: HashMap<Hash, StoredBlock>,
    canonical: HashMap<u64, Hash>,
    head: Hash,
    genesis: Hash,
    next_sequence: u64,
}

impl ChainState {
    /// Create chain state holding only the genesis block.
    pub fn with_genesis(genesis: Block) -> Self {
        let hash = genesis.hash();
        let difficulty = genesis.header.difficulty;
        let mut blocks = HashMap::new();
        blocks.insert(
            hash,
            StoredBlock {
                block: genesis,
                cumulative_difficulty: difficulty,
                sequence: 0,
                canonical: true,
            },
        );
        let mut canonical = HashMap::new();
        canonical.insert(0, hash);
        Self {
            blocks,
            canonical,
            head: hash,
            genesis: hash,
            next_sequence: 1,
        }
    }

    /// The canonical head hash.
    pub fn head_hash(&self) -> Hash {
        self.head
    }

    /// The genesis hash.
    pub fn genesis_hash(&self) -> Hash {
        self.genesis
    }

    /// The stored block at the canonical head.
    pub fn head_block(&self) -> ConsensusResult<&StoredBlock> {
        self.blocks.get(&self.head).ok_or_else(|| {
            ConsensusError::InternalInvariant(format!(
                "head {} missing from arena",
                short_hash(&self.head)
            ))
        })
    }

    /// Whether a block hash is known.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    /// Get a stored block by hash.
    pub fn get(&self, hash: &Hash) -> Option<&StoredBlock> {
        self.blocks.get(hash)
    }

    /// Get a header by hash.
    pub fn header(&self, hash: &Hash) -> Option<&BlockHeader> {
        self.blocks.get(hash).map(|stored| &stored.block.header)
    }

    /// Canonical hash at a height, if that height is on the canonical chain.
    pub fn canonical_hash_at(&self, height: u64) -> Option<Hash> {
        self.canonical.get(&height).copied()
    }

    /// Whether a block is on the canonical branch.
    pub fn is_canonical(&self, hash: &Hash) -> bool {
        self.blocks
            .get(hash)
            .map(|stored| stored.canonical)
            .unwrap_or(false)
    }

    /// Count of known blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate over all stored blocks.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (&Hash, &StoredBlock)> {
        self.blocks.iter()
    }

    /// Summary for status queries.
    pub fn info(&self) -> ConsensusResult<ChainInfo> {
        let head = self.head_block()?;
        Ok(ChainInfo {
            head: self.head,
            height: head.block.height(),
            block_count: self.blocks.len(),
            cumulative_difficulty: head.cumulative_difficulty,
        })
    }

    /// Insert a block whose parent is already present.
    ///
    /// Cumulative difficulty is the parent's plus the block's own weight.
    /// Insertion never moves the head; fork choice is a separate step.
    /// Re-inserting a known hash is a no-op reporting its standing.
    pub fn insert(&mut self, block: Block) -> ConsensusResult<InsertOutcome> {
        let hash = block.hash();
        if let Some(existing) = self.blocks.get(&hash) {
            return Ok(InsertOutcome::AlreadyKnown {
                canonical: existing.canonical,
            });
        }

        let parent_hash = block.parent_hash();
        let parent = self
            .blocks
            .get(&parent_hash)
            .ok_or_else(|| ConsensusError::UnknownParent(short_hash(&parent_hash)))?;

        let cumulative_difficulty = parent.cumulative_difficulty + block.header.difficulty;
        let extends_head = parent_hash == self.head;

        self.blocks.insert(
            hash,
            StoredBlock {
                block,
                cumulative_difficulty,
                sequence: self.next_sequence,
                canonical: false,
            },
        );
        self.next_sequence += 1;

        Ok(InsertOutcome::Inserted { extends_head })
    }

    /// Whether `ancestor` is an ancestor of (or equal to) `descendant`.
    ///
    /// Both hashes must be known.
    pub fn is_ancestor(&self, ancestor: &Hash, descendant: &Hash) -> ConsensusResult<bool> {
        let ancestor_height = self
            .header(ancestor)
            .ok_or_else(|| ConsensusError::UnknownHead(short_hash(ancestor)))?
            .height;

        let mut current = *descendant;
        loop {
            let header = self.header(&current).ok_or_else(|| {
                ConsensusError::InternalInvariant(format!(
                    "ancestor walk broke at {}",
                    short_hash(&current)
                ))
            })?;
            if header.height < ancestor_height {
                return Ok(false);
            }
            if header.height == ancestor_height {
                return Ok(current == *ancestor);
            }
            current = header.parent_hash;
        }
    }

    /// Compute the retired/adopted paths for moving the head to `new_head`.
    ///
    /// When `new_head` simply extends the current head, `retired` is empty
    /// and `ancestor` is the current head.
    pub fn reorg_paths(&self, new_head: &Hash) -> ConsensusResult<ReorgPaths> {
        // Walk the new branch down to the first canonical block.
        let mut adopted = Vec::new();
        let mut current = *new_head;
        let ancestor = loop {
            let stored = self.get(&current).ok_or_else(|| {
                ConsensusError::InternalInvariant(format!(
                    "new-branch walk broke at {}",
                    short_hash(&current)
                ))
            })?;
            if stored.canonical {
                break current;
            }
            adopted.push(current);
            current = stored.block.parent_hash();
        };
        adopted.reverse();

        // Walk the old head down to the ancestor.
        let ancestor_height = self
            .header(&ancestor)
            .map(|header| header.height)
            .unwrap_or_default();
        let mut retired = Vec::new();
        let mut current = self.head;
        while current != ancestor {
            let header = self.header(&current).ok_or_else(|| {
                ConsensusError::InternalInvariant(format!(
                    "old-branch walk broke at {}",
                    short_hash(&current)
                ))
            })?;
            if header.height <= ancestor_height {
                return Err(ConsensusError::InternalInvariant(format!(
                    "old branch bypassed ancestor {}",
                    short_hash(&ancestor)
                )));
            }
            retired.push(current);
            current = header.parent_hash;
        }

        Ok(ReorgPaths {
            ancestor,
            retired,
            adopted,
        })
    }

    /// Apply a head move computed by [`Self::reorg_paths`].
    pub fn apply_head(&mut self, new_head: Hash, paths: &ReorgPaths) -> ConsensusResult<()> {
        for hash in &paths.retired {
            let stored = self.blocks.get_mut(hash).ok_or_else(|| {
                ConsensusError::InternalInvariant(format!(
                    "retired block {} missing",
                    short_hash(hash)
                ))
            })?;
            stored.canonical = false;
            self.canonical.remove(&stored.block.height());
        }

        for hash in &paths.adopted {
            let stored = self.blocks.get_mut(hash).ok_or_else(|| {
                ConsensusError::InternalInvariant(format!(
                    "adopted block {} missing",
                    short_hash(hash)
                ))
            })?;
            stored.canonical = true;
            self.canonical.insert(stored.block.height(), *hash);
        }

        self.head = new_head;
        Ok(())
    }
}
