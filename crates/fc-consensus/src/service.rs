//! The chain manager task
//!
//! A single sequential consumer of the engine command bus. Every command is
//! fully processed — validation, insertion, fork choice, reorg — before the
//! next one is looked at, so no command ever observes partially updated
//! chain state. Status queries ride the same loop over a separate channel,
//! which keeps readers out of the writer's data structures entirely.

use crate::config::ConsensusConfig;
use crate::domain::chain::{ChainInfo, ChainState, InsertOutcome};
use crate::domain::fork_choice;
use crate::error::{short_hash, ConsensusError, ConsensusResult};
use crate::validation::BlockValidator;
use shared_bus::{EngineCommand, HeadEvent, HeadEventBus};
use shared_types::{Block, Executor, ForkchoiceState, Hash, PayloadStatus};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Capacity of the status query channel.
const QUERY_CAPACITY: usize = 32;

/// A read-only question for the chain manager.
#[derive(Debug)]
pub enum ChainQuery {
    /// Fetch a block by hash.
    BlockByHash {
        /// The hash to look up.
        hash: Hash,
        /// Single-use reply slot.
        response: oneshot::Sender<Option<Block>>,
    },
    /// Fetch a chain summary.
    Info {
        /// Single-use reply slot.
        response: oneshot::Sender<ChainInfo>,
    },
}

/// Read-only handle onto the chain manager.
///
/// `current_head` reads a watch snapshot without touching the manager;
/// block lookups are answered from the manager's loop so the single-writer
/// rule holds without shared locks.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    forkchoice: watch::Receiver<ForkchoiceState>,
    queries: mpsc::Sender<ChainQuery>,
}

impl StatusHandle {
    /// The current forkchoice pointer set.
    pub fn current_head(&self) -> ForkchoiceState {
        *self.forkchoice.borrow()
    }

    /// Fetch a block by hash. `None` when unknown or the manager is gone.
    pub async fn block_by_hash(&self, hash: Hash) -> Option<Block> {
        let (response, rx) = oneshot::channel();
        self.queries
            .send(ChainQuery::BlockByHash { hash, response })
            .await
            .ok()?;
        rx.await.ok().flatten()
    }

    /// Fetch a chain summary. `None` when the manager is gone.
    pub async fn chain_info(&self) -> Option<ChainInfo> {
        let (response, rx) = oneshot::channel();
        self.queries.send(ChainQuery::Info { response }).await.ok()?;
        rx.await.ok()
    }
}

/// The single owner and mutator of canonical chain state.
pub struct ChainManager {
    state: ChainState,
    config: ConsensusConfig,
    executor: Arc<dyn Executor>,
    commands: mpsc::Receiver<EngineCommand>,
    queries: mpsc::Receiver<ChainQuery>,
    head_events: Arc<HeadEventBus>,
    forkchoice: ForkchoiceState,
    forkchoice_tx: watch::Sender<ForkchoiceState>,
}

impl ChainManager {
    /// Create a chain manager seeded with the genesis block.
    pub fn new(
        genesis: Block,
        config: ConsensusConfig,
        executor: Arc<dyn Executor>,
        commands: mpsc::Receiver<EngineCommand>,
        head_events: Arc<HeadEventBus>,
    ) -> (Self, StatusHandle) {
        let genesis_hash = genesis.hash();
        let state = ChainState::with_genesis(genesis);
        let forkchoice = ForkchoiceState::at(genesis_hash);
        let (forkchoice_tx, forkchoice_rx) = watch::channel(forkchoice);
        let (query_tx, query_rx) = mpsc::channel(QUERY_CAPACITY);

        info!(
            genesis = %hex::encode(&genesis_hash[..8]),
            "Chain manager initialized"
        );

        let manager = Self {
            state,
            config,
            executor,
            commands,
            queries: query_rx,
            head_events,
            forkchoice,
            forkchoice_tx,
        };
        let handle = StatusHandle {
            forkchoice: forkchoice_rx,
            queries: query_tx,
        };
        (manager, handle)
    }

    /// The genesis hash this manager was seeded with.
    pub fn genesis_hash(&self) -> Hash {
        self.state.genesis_hash()
    }

    /// Drive the manager until the engine bus closes.
    ///
    /// Returns an error only on an internal invariant violation, which
    /// implies corrupted chain state; the runtime treats that as fatal.
    pub async fn run(mut self) -> ConsensusResult<()> {
        loop {
            tokio::select! {
                maybe_command = self.commands.recv() => match maybe_command {
                    Some(command) => self.process_command(command).await?,
                    None => {
                        info!("Engine bus closed, chain manager stopping");
                        break;
                    }
                },
                Some(query) = self.queries.recv() => self.process_query(query)?,
            }
        }
        Ok(())
    }

    async fn process_command(&mut self, command: EngineCommand) -> ConsensusResult<()> {
        match command {
            EngineCommand::SubmitBlock { block, response } => {
                let hash = block.hash();
                let status = match self.submit_block(block).await {
                    Ok(status) => status,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        debug!(block = %short_hash(&hash), error = %err, "Block rejected");
                        err.to_payload_status()
                    }
                };
                // The producer may have abandoned its wait; that is fine.
                let _ = response.send(status);
            }
            EngineCommand::UpdateForkChoice { state, response } => {
                let status = match self.update_fork_choice(state).await {
                    Ok(status) => status,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        debug!(error = %err, "Fork choice update rejected");
                        err.to_payload_status()
                    }
                };
                let _ = response.send(status);
            }
        }
        Ok(())
    }

    fn process_query(&mut self, query: ChainQuery) -> ConsensusResult<()> {
        match query {
            ChainQuery::BlockByHash { hash, response } => {
                let block = self.state.get(&hash).map(|stored| stored.block.clone());
                let _ = response.send(block);
            }
            ChainQuery::Info { response } => {
                let _ = response.send(self.state.info()?);
            }
        }
        Ok(())
    }

    /// Process a `SubmitBlock`: structural check, ancestry, state-transition
    /// re-verification, insert.
    async fn submit_block(&mut self, block: Block) -> ConsensusResult<PayloadStatus> {
        if block.header.is_genesis() {
            return Err(ConsensusError::GenesisWithParent);
        }

        BlockValidator::validate_structure(&block, &self.config, now_ms())?;

        let hash = block.hash();
        if let Some(existing) = self.state.get(&hash) {
            // Idempotent: re-report the block's standing, do not duplicate.
            return Ok(if existing.canonical {
                PayloadStatus::Valid
            } else {
                PayloadStatus::Accepted
            });
        }

        let parent_hash = block.parent_hash();
        let parent = self
            .state
            .header(&parent_hash)
            .ok_or_else(|| ConsensusError::UnknownParent(short_hash(&parent_hash)))?;
        BlockValidator::validate_against_parent(&block.header, parent)?;
        let parent_state_root = parent.state_root;

        // Re-execute regardless of where the block came from; the validator
        // layer is a fast-path filter, not a trust boundary.
        let outcome = self
            .executor
            .execute(&block.transactions, parent_state_root)
            .await?;
        verify_roots(&block, &outcome)?;

        let extends_head = match self.state.insert(block).map_err(|err| match err {
            // The parent was present moments ago on this very task.
            ConsensusError::UnknownParent(parent) => ConsensusError::InternalInvariant(
                format!("parent {parent} vanished after ancestor check"),
            ),
            other => other,
        })? {
            InsertOutcome::Inserted { extends_head } => extends_head,
            InsertOutcome::AlreadyKnown { canonical } => {
                return Ok(if canonical {
                    PayloadStatus::Valid
                } else {
                    PayloadStatus::Accepted
                });
            }
        };

        debug!(
            block = %short_hash(&hash),
            extends_head,
            blocks = self.state.block_count(),
            "Block inserted"
        );

        Ok(if extends_head {
            PayloadStatus::Valid
        } else {
            PayloadStatus::Accepted
        })
    }

    /// Process an `UpdateForkChoice`: pick the best tip, reorg if needed,
    /// advance the safe/finalized pointers monotonically.
    async fn update_fork_choice(
        &mut self,
        requested: ForkchoiceState,
    ) -> ConsensusResult<PayloadStatus> {
        if !self.state.contains(&requested.head) {
            return Err(ConsensusError::UnknownHead(short_hash(&requested.head)));
        }

        // The requested head is a candidate; the rule decides. Branches
        // conflicting with finality are never considered.
        let (chosen, chosen_difficulty) =
            fork_choice::best_tip_from(&self.state, &self.forkchoice.finalized)?;
        if chosen != requested.head {
            debug!(
                requested = %short_hash(&requested.head),
                chosen = %short_hash(&chosen),
                "Fork choice overrode requested head"
            );
        }

        // Resolve the prospective pointers before mutating anything so a
        // finality violation leaves state untouched.
        let finalized = self.resolve_finalized(&requested, &chosen)?;
        let safe = self.resolve_safe(&requested, &chosen, &finalized)?;

        let previous_head = self.state.head_hash();
        let mut event = None;
        if chosen != previous_head {
            let paths = self.state.reorg_paths(&chosen)?;
            if !paths.retired.is_empty() {
                warn!(
                    old_head = %short_hash(&previous_head),
                    new_head = %short_hash(&chosen),
                    retired = paths.retired.len(),
                    adopted = paths.adopted.len(),
                    "Reorganizing canonical chain"
                );
            }
            self.state.apply_head(chosen, &paths)?;
            let height = self
                .state
                .header(&chosen)
                .map(|header| header.height)
                .ok_or_else(|| {
                    ConsensusError::InternalInvariant(format!(
                        "chosen head {} missing after apply",
                        short_hash(&chosen)
                    ))
                })?;
            event = Some(HeadEvent {
                new_head: chosen,
                height,
                previous_head,
                common_ancestor: paths.ancestor,
                retired: paths.retired,
                adopted: paths.adopted,
                forkchoice: ForkchoiceState {
                    head: chosen,
                    safe,
                    finalized,
                },
            });
        }

        self.forkchoice = ForkchoiceState {
            head: chosen,
            safe,
            finalized,
        };
        let _ = self.forkchoice_tx.send(self.forkchoice);

        if let Some(event) = event {
            info!(
                head = %short_hash(&chosen),
                height = event.height,
                difficulty = %chosen_difficulty,
                reorg = event.is_reorg(),
                "Canonical head updated"
            );
            self.head_events.publish(event);
        }

        Ok(PayloadStatus::Valid)
    }

    fn resolve_finalized(
        &self,
        requested: &ForkchoiceState,
        chosen_head: &Hash,
    ) -> ConsensusResult<Hash> {
        if requested.finalized == Hash::default() {
            return Ok(self.forkchoice.finalized);
        }
        let finalized = requested.finalized;
        if !self.state.contains(&finalized) {
            return Err(ConsensusError::FinalityViolation(format!(
                "finalized block {} unknown",
                short_hash(&finalized)
            )));
        }
        if !self.state.is_ancestor(&finalized, chosen_head)? {
            return Err(ConsensusError::FinalityViolation(format!(
                "finalized block {} not an ancestor of the head",
                short_hash(&finalized)
            )));
        }
        // Finality is irreversible: the new pointer must descend from the
        // old one.
        if !self.state.is_ancestor(&self.forkchoice.finalized, &finalized)? {
            return Err(ConsensusError::FinalityViolation(format!(
                "finalized pointer would roll back past {}",
                short_hash(&self.forkchoice.finalized)
            )));
        }
        Ok(finalized)
    }

    fn resolve_safe(
        &self,
        requested: &ForkchoiceState,
        chosen_head: &Hash,
        finalized: &Hash,
    ) -> ConsensusResult<Hash> {
        if requested.safe == Hash::default() {
            // Carry the previous safe pointer forward while it remains on
            // the chosen branch; otherwise fall back to finalized.
            let previous = self.forkchoice.safe;
            if self.state.contains(&previous)
                && self.state.is_ancestor(&previous, chosen_head)?
                && self.state.is_ancestor(finalized, &previous)?
            {
                return Ok(previous);
            }
            return Ok(*finalized);
        }
        let safe = requested.safe;
        if !self.state.contains(&safe) {
            return Err(ConsensusError::FinalityViolation(format!(
                "safe block {} unknown",
                short_hash(&safe)
            )));
        }
        if !self.state.is_ancestor(&safe, chosen_head)?
            || !self.state.is_ancestor(finalized, &safe)?
        {
            return Err(ConsensusError::FinalityViolation(format!(
                "safe block {} outside finalized..head",
                short_hash(&safe)
            )));
        }
        Ok(safe)
    }
}

fn verify_roots(block: &Block, outcome: &shared_types::ExecutionOutcome) -> ConsensusResult<()> {
    let header = &block.header;
    if outcome.state_root != header.state_root {
        return Err(ConsensusError::RootMismatch {
            field: "state_root",
            declared: hex::encode(header.state_root),
            computed: hex::encode(outcome.state_root),
        });
    }
    if outcome.receipts_root != header.receipts_root {
        return Err(ConsensusError::RootMismatch {
            field: "receipts_root",
            declared: hex::encode(header.receipts_root),
            computed: hex::encode(outcome.receipts_root),
        });
    }
    if outcome.logs_digest != header.logs_digest {
        return Err(ConsensusError::RootMismatch {
            field: "logs_digest",
            declared: hex::encode(header.logs_digest),
            computed: hex::encode(outcome.logs_digest),
        });
    }
    if outcome.gas_used != header.gas_used {
        return Err(ConsensusError::RootMismatch {
            field: "gas_used",
            declared: header.gas_used.to_string(),
            computed: outcome.gas_used.to_string(),
        });
    }
    Ok(())
}

/// Milliseconds since epoch from the system clock.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
