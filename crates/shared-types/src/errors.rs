//! # Error Types
//!
//! Defines error types shared across subsystems. Subsystem-local errors live
//! in their own crates; only errors crossing a port boundary belong here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the external block executor capability.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionError {
    /// A transaction spent more than its sender holds.
    #[error("Insufficient balance for sender {sender}")]
    InsufficientBalance {
        /// Hex-encoded sender address.
        sender: String,
    },

    /// The body consumed more gas than the block gas limit.
    #[error("Gas exceeded: used {used}, limit {limit}")]
    GasExceeded {
        /// Actual gas used.
        used: u64,
        /// Block gas limit.
        limit: u64,
    },

    /// The parent state the executor was asked to build on is unknown.
    #[error("Unknown parent state root")]
    UnknownParentState,

    /// Any other executor-internal failure.
    #[error("Execution failed: {0}")]
    Internal(String),
}
