//! Configuration for block propagation

use serde::{Deserialize, Serialize};

/// Propagation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Maximum ancestor chain length fetched for an unknown-parent block.
    pub max_ancestor_depth: u32,

    /// Bound on the seen-block suppression cache.
    pub seen_cache_size: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 32,
            seen_cache_size: 4_096,
        }
    }
}
