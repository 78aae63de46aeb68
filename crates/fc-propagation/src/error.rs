//! Error types for block propagation

use shared_bus::EngineError;
use thiserror::Error;

/// Result type alias for propagation operations
pub type PropagationResult<T> = std::result::Result<T, PropagationError>;

/// Errors that can occur while importing or relaying peer blocks.
#[derive(Debug, Clone, Error)]
pub enum PropagationError {
    /// The pre-check filter rejected the block; the peer may be penalized.
    #[error("Block {hash} rejected by pre-check: {reason}")]
    RejectedByPreCheck {
        /// Short hex of the block hash.
        hash: String,
        /// Rejection reason from the validator.
        reason: String,
    },

    /// The block was already seen; dropped without touching the bus.
    #[error("Block {hash} already seen")]
    AlreadySeen {
        /// Short hex of the block hash.
        hash: String,
    },

    /// The chain manager rejected the block as invalid.
    #[error("Block {hash} rejected by the chain manager: {reason}")]
    RejectedByManager {
        /// Short hex of the block hash.
        hash: String,
        /// Rejection reason from the manager.
        reason: String,
    },

    /// Peers returned no ancestors for an unknown-parent block.
    #[error("Ancestor fetch for {hash} returned nothing")]
    AncestorFetchFailed {
        /// Short hex of the block hash.
        hash: String,
    },

    /// The ancestor chain did not connect within the configured depth.
    #[error("Ancestor chain for {hash} exceeds depth {depth}")]
    DepthExceeded {
        /// Short hex of the block hash.
        hash: String,
        /// Configured depth bound.
        depth: u32,
    },

    /// The engine command bus is gone.
    #[error("Engine command bus closed")]
    EngineClosed,
}

impl From<EngineError> for PropagationError {
    fn from(_: EngineError) -> Self {
        Self::EngineClosed
    }
}

impl PropagationError {
    /// Whether the originating peer should be penalized for this failure.
    ///
    /// Penalty policy itself is external; this is only the signal.
    pub fn is_peer_fault(&self) -> bool {
        matches!(
            self,
            Self::RejectedByPreCheck { .. } | Self::RejectedByManager { .. }
        )
    }
}
