//! # Block Production
//!
//! The local mining pipeline: a worker pool shards the nonce space across
//! OS threads and returns the first candidate whose proof-of-work hash
//! satisfies the target; the assembler turns a solved candidate plus pending
//! transactions into a complete block via the external executor; the miner
//! task drives search → assemble → submit against the engine bus and
//! restarts the search whenever the canonical head moves.
//!
//! Workers never touch chain state. Their only side effect is the candidate
//! they deliver.

pub mod assembler;
pub mod config;
pub mod error;
pub mod miner;
pub mod template;
pub mod worker;

pub use assembler::BlockAssembler;
pub use config::MiningConfig;
pub use error::{MiningError, MiningResult};
pub use miner::Miner;
pub use template::BlockTemplate;
pub use worker::{Solution, WorkerPool};
