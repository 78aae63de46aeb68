//! # Block Propagation
//!
//! The stateless relay between the network and the engine bus:
//!
//! - **Import pre-check**: structural and proof-of-work validation of
//!   peer-supplied blocks before they may occupy the chain manager's
//!   serialized processing time. A fast-path filter, not a trust boundary —
//!   the manager re-verifies everything.
//! - **Announcer**: fire-and-forget announcements of every new canonical
//!   head to connected peers.
//! - **Peer importer**: drives announced blocks through the engine bus,
//!   backfilling missing ancestors from peers up to a bounded depth.

pub mod announcer;
pub mod config;
pub mod error;
pub mod import;
pub mod importer;
pub mod ports;

pub use announcer::Announcer;
pub use config::PropagationConfig;
pub use error::{PropagationError, PropagationResult};
pub use import::ImportValidator;
pub use importer::PeerImporter;
pub use ports::{PeerId, PeerTransport};
