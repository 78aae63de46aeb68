//! Difficulty retargeting
//!
//! Per-block adjustment toward the configured block time: a block arriving
//! faster than target nudges difficulty up, a slow one nudges it down, with
//! the step clamped and a hard floor. The miner asks this calculator for the
//! difficulty of the next candidate; the chain manager only enforces the
//! floor (declared difficulty is part of the sealed header).

use crate::config::ConsensusConfig;
use shared_types::{BlockHeader, U256};

/// Fixed-point scale for fractional adjustment arithmetic.
const ADJUSTMENT_SCALE: u64 = 1_000_000;

/// Difficulty adjustment calculator.
#[derive(Debug, Clone)]
pub struct DifficultyCalculator {
    /// Target block time in milliseconds.
    target_time_ms: u64,
    /// Maximum adjustment per block (fraction).
    max_adjustment: f64,
    /// Minimum difficulty.
    min_difficulty: U256,
}

impl DifficultyCalculator {
    /// Create a calculator from the consensus configuration.
    pub fn new(config: &ConsensusConfig) -> Self {
        Self {
            target_time_ms: config.target_block_time_ms,
            max_adjustment: config.max_difficulty_adjustment,
            min_difficulty: config.min_difficulty,
        }
    }

    /// Get the minimum difficulty.
    pub fn min_difficulty(&self) -> U256 {
        self.min_difficulty
    }

    /// Calculate the difficulty for a block built on `parent` at `timestamp`.
    pub fn next_difficulty(&self, parent: &BlockHeader, timestamp: u64) -> U256 {
        let time_diff = timestamp.saturating_sub(parent.timestamp);

        // Identical timestamps mean hashing is outrunning the clock;
        // push difficulty up a notch.
        if time_diff == 0 {
            return self.apply_adjustment(parent.difficulty, 0.1);
        }

        let target = self.target_time_ms as f64;
        let actual = time_diff as f64;
        let raw_adjustment = (target - actual) / target * 0.1;
        let adjustment = raw_adjustment.clamp(-self.max_adjustment, self.max_adjustment);

        self.apply_adjustment(parent.difficulty, adjustment)
    }

    fn apply_adjustment(&self, difficulty: U256, adjustment: f64) -> U256 {
        let multiplier = 1.0 + adjustment;
        let multiplier_fixed = (multiplier * ADJUSTMENT_SCALE as f64) as u64;
        let new_difficulty =
            difficulty * U256::from(multiplier_fixed) / U256::from(ADJUSTMENT_SCALE);

        if new_difficulty < self.min_difficulty {
            return self.min_difficulty;
        }

        new_difficulty
    }
}
