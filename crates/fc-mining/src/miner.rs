//! The miner task
//!
//! Drives the production loop: read the canonical head, build a template,
//! run the worker pool, assemble the solved candidate, submit it over the
//! engine bus, and push fork choice to the new block. A head-change
//! notification cancels the in-flight search and restarts it on the new
//! parent; there is no mining deadline.

use crate::assembler::BlockAssembler;
use crate::config::MiningConfig;
use crate::error::MiningError;
use crate::template::BlockTemplate;
use crate::worker::{Solution, WorkerPool};
use fc_consensus::{ConsensusConfig, DifficultyCalculator, StatusHandle};
use shared_bus::{EngineHandle, HeadEvents};
use shared_types::{Executor, ForkchoiceState, Hash, PayloadStatus, TransactionSource};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a single production round ended with.
enum RoundOutcome {
    /// A block was mined and fork choice pushed to it.
    Mined,
    /// The search was cancelled by a head change; restart on the new head.
    Restarted,
    /// The round failed recoverably; retry on the same parent.
    Retry,
    /// The engine or the manager is gone; stop the miner.
    Shutdown,
}

/// The local block producer.
pub struct Miner {
    engine: EngineHandle,
    status: StatusHandle,
    head_events: HeadEvents,
    pool: Arc<WorkerPool>,
    assembler: BlockAssembler,
    difficulty: DifficultyCalculator,
    config: MiningConfig,
    blocks_mined: u64,
}

impl Miner {
    /// Create a miner wired to the engine bus and the chain manager.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: MiningConfig,
        consensus_config: &ConsensusConfig,
        engine: EngineHandle,
        status: StatusHandle,
        head_events: HeadEvents,
        executor: Arc<dyn Executor>,
        tx_source: Arc<dyn TransactionSource>,
    ) -> Self {
        let pool = Arc::new(WorkerPool::new(config.clone()));
        let assembler = BlockAssembler::new(executor, tx_source, consensus_config.gas_limit);
        let difficulty = DifficultyCalculator::new(consensus_config);
        Self {
            engine,
            status,
            head_events,
            pool,
            assembler,
            difficulty,
            config,
            blocks_mined: 0,
        }
    }

    /// The worker pool, exposed for external cancellation on shutdown.
    pub fn pool(&self) -> Arc<WorkerPool> {
        Arc::clone(&self.pool)
    }

    /// Run the production loop until the engine bus closes.
    pub async fn run(mut self) {
        info!(
            threads = self.config.threads,
            beneficiary = %hex::encode(self.config.beneficiary),
            "Miner started"
        );

        loop {
            match self.mine_round().await {
                RoundOutcome::Mined => {
                    self.blocks_mined += 1;
                    debug!(blocks_mined = self.blocks_mined, "Production round complete");
                }
                RoundOutcome::Restarted | RoundOutcome::Retry => {}
                RoundOutcome::Shutdown => break,
            }
        }

        info!(blocks_mined = self.blocks_mined, "Miner stopped");
    }

    /// One production round: search, assemble, submit, push fork choice.
    async fn mine_round(&mut self) -> RoundOutcome {
        let head = self.status.current_head().head;
        let Some(parent) = self.status.block_by_hash(head).await else {
            // The watch snapshot always names a stored block; a miss means
            // the manager is gone.
            warn!("Chain manager unavailable, miner stopping");
            return RoundOutcome::Shutdown;
        };

        let timestamp = now_ms().max(parent.header.timestamp);
        let difficulty = self.difficulty.next_difficulty(&parent.header, timestamp);
        let template = BlockTemplate::on_parent(
            &parent.header,
            timestamp,
            difficulty,
            self.config.beneficiary,
            self.config.extra_data.clone(),
        );

        self.pool.reset();
        let mut search = self.spawn_search(template);

        let solution = loop {
            tokio::select! {
                result = &mut search => match result {
                    Ok(Ok(solution)) => break solution,
                    Ok(Err(MiningError::Cancelled)) => return RoundOutcome::Restarted,
                    Ok(Err(err)) => {
                        warn!(error = %err, "Nonce search failed");
                        return RoundOutcome::Retry;
                    }
                    Err(_) => return RoundOutcome::Shutdown,
                },
                maybe_event = self.head_events.recv() => match maybe_event {
                    Some(event) if event.new_head != head => {
                        debug!(
                            old_parent = %hex::encode(&head[..8]),
                            new_parent = %hex::encode(&event.new_head[..8]),
                            "Head moved, restarting search"
                        );
                        self.pool.cancel();
                        let _ = (&mut search).await;
                        return RoundOutcome::Restarted;
                    }
                    // Stale notification for the parent we already mine on.
                    Some(_) => continue,
                    None => {
                        self.pool.cancel();
                        let _ = (&mut search).await;
                        return RoundOutcome::Shutdown;
                    }
                },
            }
        };

        self.seal_and_submit(solution, parent.header.state_root).await
    }

    async fn seal_and_submit(&mut self, solution: Solution, parent_state_root: Hash) -> RoundOutcome {
        let hashrate = solution.hashrate();
        let block = match self
            .assembler
            .assemble(solution.candidate, parent_state_root)
            .await
        {
            Ok(block) => block,
            Err(err) => {
                // Candidate discarded; resume searching on the same parent.
                warn!(error = %err, "Assembly failed, candidate discarded");
                return RoundOutcome::Retry;
            }
        };

        let block_hash = block.hash();
        let height = block.height();
        match self.engine.submit_block(block).await {
            Ok(status) if status.is_valid() => {
                info!(
                    block = %hex::encode(&block_hash[..8]),
                    height,
                    hashrate = format!("{hashrate:.2} H/s"),
                    "Mined block submitted"
                );
            }
            Ok(PayloadStatus::Syncing) => {
                warn!(height, "Local submission answered syncing");
                return RoundOutcome::Retry;
            }
            Ok(PayloadStatus::Invalid { reason }) => {
                warn!(height, reason, "Mined block rejected");
                return RoundOutcome::Retry;
            }
            Ok(_) | Err(_) => return RoundOutcome::Shutdown,
        }

        match self
            .engine
            .update_fork_choice(ForkchoiceState {
                head: block_hash,
                ..Default::default()
            })
            .await
        {
            Ok(_) => RoundOutcome::Mined,
            Err(_) => RoundOutcome::Shutdown,
        }
    }

    fn spawn_search(&self, template: BlockTemplate) -> JoinHandle<Result<Solution, MiningError>> {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move { pool.search_async(template).await })
    }
}

/// Milliseconds since epoch from the system clock.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
