//! Shared test fixtures
//!
//! Builders for sealed blocks that satisfy both the proof-of-work rules and
//! the dev executor's deterministic roots, plus a launched-node harness with
//! mining disabled so tests control the chain explicitly.

use fc_consensus::pow;
use node_runtime::{DevExecutor, LoopbackTransport, Node, NodeConfig, StaticTransactionSource};
use shared_types::{
    compute_transactions_root, difficulty_to_target, Block, BlockHeader, Transaction, U256,
};
use std::sync::Arc;

/// Solve the proof-of-work seal on a header.
pub fn seal(mut header: BlockHeader) -> BlockHeader {
    let seal_hash = header.seal_hash();
    let target = difficulty_to_target(header.difficulty);
    let mut nonce = 0u64;
    loop {
        let out = pow::pow_hash(&seal_hash, nonce);
        if pow::meets_target(&out.hash, target) {
            header.nonce = nonce;
            header.mix_digest = out.mix_digest;
            return header;
        }
        nonce += 1;
    }
}

/// Build a sealed child of `parent` whose roots match the dev executor.
pub fn build_child(parent: &Block, difficulty: u64, extra: u8, transactions: Vec<Transaction>) -> Block {
    let outcome = DevExecutor::outcome_for(&transactions, parent.header.state_root)
        .expect("dev executor outcome");
    let header = seal(BlockHeader {
        parent_hash: parent.hash(),
        height: parent.height() + 1,
        timestamp: parent.header.timestamp + 4_000,
        difficulty: U256::from(difficulty),
        extra_data: vec![extra],
        state_root: outcome.state_root,
        transactions_root: compute_transactions_root(&transactions),
        receipts_root: outcome.receipts_root,
        logs_digest: outcome.logs_digest,
        gas_used: outcome.gas_used,
        gas_limit: 30_000_000,
        ..Default::default()
    });
    Block::new(header, transactions)
}

/// Build a sealed linear chain of `length` children from `parent`.
pub fn build_chain(parent: &Block, length: u64, difficulty: u64) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(length as usize);
    let mut current = parent.clone();
    for step in 0..length {
        let child = build_child(&current, difficulty, step as u8, vec![]);
        current = child.clone();
        blocks.push(child);
    }
    blocks
}

/// Node harness configuration: trivial difficulty floor, mining off unless
/// a test asks for it.
pub fn test_config(mining_enabled: bool) -> NodeConfig {
    NodeConfig {
        consensus: fc_consensus::ConsensusConfig {
            min_difficulty: U256::one(),
            ..Default::default()
        },
        genesis: fc_consensus::GenesisConfig {
            difficulty: U256::from(10u64),
            ..Default::default()
        },
        mining: fc_mining::MiningConfig {
            threads: 1,
            batch_size: 100,
            ..Default::default()
        },
        mining_enabled,
        ..Default::default()
    }
}

/// A launched node plus its loopback peer fabric.
pub struct Harness {
    pub node: Node,
    pub transport: Arc<LoopbackTransport>,
    pub genesis: Block,
}

/// Launch a node on the dev adapters.
pub fn launch(mining_enabled: bool) -> Harness {
    let config = test_config(mining_enabled);
    let genesis = fc_consensus::domain::genesis::build_genesis(&config.genesis);
    let transport = Arc::new(LoopbackTransport::new());
    let node = Node::launch(
        config,
        Arc::new(DevExecutor),
        Arc::new(StaticTransactionSource::new()),
        Arc::clone(&transport) as _,
    );
    Harness {
        node,
        transport,
        genesis,
    }
}
