//! # Forgechain Node
//!
//! Entry point for the development node: deterministic dev executor, empty
//! transaction source, loopback transport. Real deployments inject real
//! collaborators through [`node_runtime::Node::launch`].

use anyhow::Context;
use node_runtime::{DevExecutor, LoopbackTransport, Node, NodeConfig, StaticTransactionSource};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => NodeConfig::load(&path).context("loading node config")?,
        None => {
            info!("No config file given, using defaults");
            NodeConfig::default()
        }
    };

    let node = Node::launch(
        config,
        Arc::new(DevExecutor),
        Arc::new(StaticTransactionSource::new()),
        Arc::new(LoopbackTransport::new()),
    );

    tokio::select! {
        result = node.join() => {
            if let Err(err) = result {
                // Invariant violations leave chain state unusable; exit so
                // supervision restarts the process.
                error!(error = %err, "Chain manager failed");
                anyhow::bail!("chain manager failed: {err}");
            }
            info!("Node stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
        }
    }

    Ok(())
}
