//! # Shared Bus - Engine Commands and Head Events
//!
//! Two channels connect the Forgechain subsystems:
//!
//! - **Engine command bus**: a many-producer, single-consumer ordered channel
//!   carrying `SubmitBlock` / `UpdateForkChoice` commands to the chain
//!   manager. Each command carries a single-use response slot; the manager
//!   replies exactly once, and a producer abandoning its wait does not
//!   disturb processing.
//! - **Head event bus**: a broadcast channel on which the chain manager
//!   announces head changes to the miner and the propagation layer, in the
//!   order the corresponding fork-choice updates completed.
//!
//! Direct calls between subsystems are not part of the design; everything
//! flows through these two channels or through read-only snapshots.

pub mod engine;
pub mod events;

// Re-export main types
pub use engine::{default_engine_channel, engine_channel, EngineCommand, EngineError, EngineHandle};
pub use events::{HeadEvent, HeadEventBus, HeadEventStream, HeadEvents, SubscriptionError};

/// Default capacity of the engine command channel.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Maximum head events to buffer per subscriber before lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        assert_eq!(DEFAULT_COMMAND_CAPACITY, 64);
        assert_eq!(DEFAULT_EVENT_CAPACITY, 1000);
    }
}
