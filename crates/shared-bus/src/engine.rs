//! # Engine Command Bus
//!
//! The ordered, asynchronous request/response channel between block
//! producers (local miner, peer-import pipeline) and the chain manager.
//!
//! Commands from a single producer are processed in submission order;
//! commands from different producers interleave, but the chain manager
//! drains the queue strictly sequentially, so no two commands ever observe
//! partially updated chain state.

use shared_types::{Block, ForkchoiceState, PayloadStatus};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::DEFAULT_COMMAND_CAPACITY;

/// Errors from the engine command bus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The chain manager is gone; no command can be delivered or answered.
    #[error("Engine command bus closed")]
    Closed,
}

/// A command for the chain manager.
///
/// Immutable after creation. The `response` slot is single-use: the chain
/// manager sends exactly one status through it, and a dropped receiver is
/// tolerated (the send result is discarded).
#[derive(Debug)]
pub enum EngineCommand {
    /// Validate and insert a block into chain state.
    SubmitBlock {
        /// The block to insert.
        block: Block,
        /// Single-use reply slot.
        response: oneshot::Sender<PayloadStatus>,
    },
    /// Re-evaluate fork choice with a new candidate pointer set.
    UpdateForkChoice {
        /// The requested pointer set.
        state: ForkchoiceState,
        /// Single-use reply slot.
        response: oneshot::Sender<PayloadStatus>,
    },
}

impl EngineCommand {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmitBlock { .. } => "submit_block",
            Self::UpdateForkChoice { .. } => "update_fork_choice",
        }
    }
}

/// Producer handle onto the engine command bus.
///
/// Cheap to clone; every producer holds its own handle. Sends preserve
/// per-producer FIFO order.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Enqueue a `SubmitBlock` command and await its status.
    pub async fn submit_block(&self, block: Block) -> Result<PayloadStatus, EngineError> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::SubmitBlock { block, response })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Enqueue an `UpdateForkChoice` command and await its status.
    pub async fn update_fork_choice(
        &self,
        state: ForkchoiceState,
    ) -> Result<PayloadStatus, EngineError> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::UpdateForkChoice { state, response })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Enqueue a `SubmitBlock` without waiting for the reply.
    ///
    /// The chain manager still processes the command fully and discards the
    /// orphaned response.
    pub async fn submit_block_detached(&self, block: Block) -> Result<(), EngineError> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::SubmitBlock { block, response })
            .await
            .map_err(|_| EngineError::Closed)?;
        drop(rx);
        debug!("Detached block submission enqueued");
        Ok(())
    }
}

/// Create the engine command channel.
///
/// Returns the cloneable producer handle and the single consumer receiver
/// the chain manager drains.
pub fn engine_channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<EngineCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EngineHandle { tx }, rx)
}

/// Create the engine command channel with the default capacity.
pub fn default_engine_channel() -> (EngineHandle, mpsc::Receiver<EngineCommand>) {
    engine_channel(DEFAULT_COMMAND_CAPACITY)
}
