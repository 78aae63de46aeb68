//! Subsystem wiring
//!
//! Builds the buses, seeds the chain manager with genesis, and spawns the
//! manager / miner / announcer tasks. The chain manager is the only task
//! whose failure is fatal: an internal invariant violation means chain
//! state is corrupt and the process must restart.

use fc_consensus::domain::genesis::build_genesis;
use fc_consensus::{ChainManager, ConsensusResult, StatusHandle};
use fc_mining::Miner;
use fc_propagation::{Announcer, ImportValidator, PeerImporter, PeerTransport};
use shared_bus::{default_engine_channel, EngineHandle, HeadEventBus};
use shared_types::{Executor, Hash, TransactionSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::NodeConfig;

/// A running Forgechain node.
pub struct Node {
    /// Producer handle onto the engine bus.
    pub engine: EngineHandle,
    /// Read-only chain status.
    pub status: StatusHandle,
    /// Head-change notifications.
    pub head_events: Arc<HeadEventBus>,
    /// Entry point for peer-announced blocks.
    pub importer: Arc<PeerImporter>,
    /// Genesis hash of the launched chain.
    pub genesis_hash: Hash,

    manager_task: JoinHandle<ConsensusResult<()>>,
    miner_task: Option<JoinHandle<()>>,
    announcer_task: JoinHandle<()>,
}

impl Node {
    /// Build and spawn every subsystem.
    pub fn launch(
        config: NodeConfig,
        executor: Arc<dyn Executor>,
        tx_source: Arc<dyn TransactionSource>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let genesis = build_genesis(&config.genesis);
        let genesis_hash = genesis.hash();
        info!(genesis = %hex::encode(&genesis_hash[..8]), "Launching node");

        let (engine, commands) = default_engine_channel();
        let head_events = Arc::new(HeadEventBus::new());

        let (manager, status) = ChainManager::new(
            genesis,
            config.consensus.clone(),
            Arc::clone(&executor),
            commands,
            Arc::clone(&head_events),
        );
        let manager_task = tokio::spawn(manager.run());

        let miner_task = if config.mining_enabled {
            let miner = Miner::new(
                config.mining.clone(),
                &config.consensus,
                engine.clone(),
                status.clone(),
                head_events.subscribe(),
                Arc::clone(&executor),
                tx_source,
            );
            Some(tokio::spawn(miner.run()))
        } else {
            None
        };

        let validator = Arc::new(ImportValidator::new(
            config.consensus.clone(),
            &config.propagation,
        ));
        let importer = Arc::new(PeerImporter::new(
            validator,
            engine.clone(),
            Arc::clone(&transport),
            config.propagation.clone(),
        ));
        let announcer = Announcer::new(head_events.subscribe(), transport);
        let announcer_task = tokio::spawn(announcer.run());

        Self {
            engine,
            status,
            head_events,
            importer,
            genesis_hash,
            manager_task,
            miner_task,
            announcer_task,
        }
    }

    /// Wait for the chain manager to stop.
    ///
    /// Returns the manager's verdict: `Ok` on clean shutdown, the internal
    /// invariant violation otherwise.
    pub async fn join(self) -> ConsensusResult<()> {
        let result = match self.manager_task.await {
            Ok(result) => result,
            Err(_) => Ok(()),
        };
        if let Some(miner) = self.miner_task {
            miner.abort();
        }
        self.announcer_task.abort();
        result
    }

    /// Stop every task.
    pub async fn shutdown(self) {
        info!("Shutting down node");
        self.manager_task.abort();
        if let Some(miner) = self.miner_task {
            miner.abort();
        }
        self.announcer_task.abort();
    }
}
