//! # Forgechain Test Suite
//!
//! Unified test crate containing cross-subsystem integration tests and the
//! chain-level property checks.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Fixtures: sealed blocks, launched nodes
//! └── integration/
//!     ├── chain_properties.rs  # Invariants over accepted chain state
//!     ├── fork_choice.rs       # Weights, reorgs, head events
//!     ├── mining_flow.rs       # Worker cancellation, production loop
//!     └── propagation_flow.rs  # Announcements, ancestor backfill
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fc-tests
//! cargo test -p fc-tests integration::fork_choice::
//! ```

pub mod support;

pub mod integration {
    pub mod chain_properties;
    pub mod fork_choice;
    pub mod mining_flow;
    pub mod propagation_flow;
}
