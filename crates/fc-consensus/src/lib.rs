//! # Chain Manager
//!
//! The single owner and mutator of canonical chain state. Blocks arrive as
//! engine commands (from the local miner or the peer-import pipeline), are
//! validated structurally, against proof-of-work, and against the external
//! executor, then inserted into the in-memory chain arena. Fork choice picks
//! the tip with the highest cumulative difficulty (first seen wins ties),
//! and head changes are broadcast to the rest of the node.
//!
//! Everything in this crate runs on one sequential task; no other component
//! ever holds a mutable reference to chain state.

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod validation;

pub use config::{ConsensusConfig, GenesisConfig};
pub use domain::chain::{ChainInfo, ChainState, InsertOutcome};
pub use domain::difficulty::DifficultyCalculator;
pub use domain::pow;
pub use error::{ConsensusError, ConsensusResult};
pub use service::{ChainManager, StatusHandle};
pub use validation::BlockValidator;
