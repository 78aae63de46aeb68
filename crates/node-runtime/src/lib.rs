//! # Forgechain Node Runtime
//!
//! Wires the subsystems into a running node:
//!
//! ```text
//! WorkerPool ──▶ Assembler ──▶ ┌─────────────┐
//!                              │ Engine Bus  │ ──▶ ChainManager ──▶ HeadEvents
//! Peers ──▶ ImportValidator ──▶└─────────────┘          │               │
//!   ▲                                                   │               │
//!   └───────────── Announcer ◀──────────────────────────┴───────────────┘
//! ```
//!
//! The external capabilities (block executor, transaction source, peer
//! transport) are injected; `adapters` provides deterministic in-process
//! implementations for development and testing.

pub mod adapters;
pub mod config;
pub mod wiring;

pub use adapters::{DevExecutor, LoopbackTransport, StaticTransactionSource};
pub use config::NodeConfig;
pub use wiring::Node;
