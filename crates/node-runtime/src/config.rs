//! Node configuration

use anyhow::Context;
use fc_consensus::{ConsensusConfig, GenesisConfig};
use fc_mining::MiningConfig;
use fc_propagation::PropagationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Consensus rules and validation limits.
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// Genesis block parameters.
    #[serde(default)]
    pub genesis: GenesisConfig,

    /// Local mining settings.
    #[serde(default)]
    pub mining: MiningConfig,

    /// Whether this node produces blocks.
    #[serde(default = "default_true")]
    pub mining_enabled: bool,

    /// Propagation settings.
    #[serde(default)]
    pub propagation: PropagationConfig,
}

fn default_true() -> bool {
    true
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            consensus: ConsensusConfig::default(),
            genesis: GenesisConfig::default(),
            mining: MiningConfig::default(),
            mining_enabled: true,
            propagation: PropagationConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
