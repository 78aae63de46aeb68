//! Mining worker pool
//!
//! Shards the nonce space across OS threads. Every shard polls the shared
//! found/cancel flags once per batch, so the wasted work after a head change
//! is bounded by `batch_size` hashes per thread.

use crate::config::MiningConfig;
use crate::error::{MiningError, MiningResult};
use crate::template::BlockTemplate;
use fc_consensus::pow;
use shared_types::CandidateHeader;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of a successful nonce search.
#[derive(Debug, Clone)]
pub struct Solution {
    /// The solved candidate (nonce and mix digest filled in).
    pub candidate: CandidateHeader,
    /// Number of hashes computed across all shards.
    pub hashes_computed: u64,
    /// Time taken to find the solution.
    pub duration: Duration,
}

impl Solution {
    /// Hashrate in H/s.
    pub fn hashrate(&self) -> f64 {
        self.hashes_computed as f64 / self.duration.as_secs_f64().max(f64::EPSILON)
    }
}

/// Parallel nonce search over a block template.
///
/// The pool holds the cancellation flag; `cancel` is checked cooperatively
/// by every shard. `reset` re-arms the pool for the next search.
pub struct WorkerPool {
    config: MiningConfig,
    cancelled: Arc<AtomicBool>,
    total_hashes: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            total_hashes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel the ongoing search.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Re-arm the pool for a new search.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.total_hashes.store(0, Ordering::SeqCst);
    }

    /// Hashes computed in the current search.
    pub fn hash_count(&self) -> u64 {
        self.total_hashes.load(Ordering::Relaxed)
    }

    /// Search the nonce space for a seal (blocking).
    ///
    /// Exactly one shard's candidate is returned; the found flag stops all
    /// siblings. Runs until solved or cancelled — there is no deadline, the
    /// caller restarts on head changes instead.
    pub fn search(&self, template: &BlockTemplate) -> MiningResult<Solution> {
        let start = Instant::now();
        let seal_hash = template.seal_hash();
        let target = template.target();
        let threads = self.config.threads.max(1) as u64;
        let batch_size = self.config.batch_size.max(1);

        info!(
            height = template.height,
            difficulty = %template.difficulty,
            threads,
            "Starting nonce search"
        );

        let found = Arc::new(AtomicBool::new(false));
        let winning_nonce = Arc::new(AtomicU64::new(0));

        // Divide the nonce space into disjoint shards.
        let shard_len = u64::MAX / threads;

        let mut handles = Vec::with_capacity(threads as usize);
        for shard in 0..threads {
            let found = Arc::clone(&found);
            let winning_nonce = Arc::clone(&winning_nonce);
            let cancelled = Arc::clone(&self.cancelled);
            let total_hashes = Arc::clone(&self.total_hashes);

            let handle = std::thread::spawn(move || {
                let shard_start = shard * shard_len;
                let shard_end = if shard == threads - 1 {
                    u64::MAX
                } else {
                    (shard + 1) * shard_len
                };

                // Random start offset so repeated searches over the same
                // template do not retrace the same nonces.
                let offset = rand::random::<u64>() % shard_len.max(1) / 2;
                let mut nonce = shard_start + offset;
                while nonce < shard_end {
                    if found.load(Ordering::Relaxed) || cancelled.load(Ordering::Relaxed) {
                        return;
                    }

                    let batch_end = nonce.saturating_add(batch_size).min(shard_end);
                    let mut tried = 0u64;
                    while nonce < batch_end {
                        let out = pow::pow_hash(&seal_hash, nonce);
                        tried += 1;
                        if pow::meets_target(&out.hash, target) {
                            total_hashes.fetch_add(tried, Ordering::Relaxed);
                            winning_nonce.store(nonce, Ordering::SeqCst);
                            found.store(true, Ordering::SeqCst);
                            return;
                        }
                        nonce += 1;
                    }
                    total_hashes.fetch_add(tried, Ordering::Relaxed);
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.join();
        }

        let hashes = self.total_hashes.load(Ordering::Relaxed);
        if self.cancelled.load(Ordering::Relaxed) && !found.load(Ordering::SeqCst) {
            debug!(height = template.height, hashes, "Nonce search cancelled");
            return Err(MiningError::Cancelled);
        }

        if !found.load(Ordering::SeqCst) {
            return Err(MiningError::NonceSpaceExhausted);
        }

        let nonce = winning_nonce.load(Ordering::SeqCst);
        // One extra hash to recover the mix digest of the winning nonce.
        let out = pow::pow_hash(&seal_hash, nonce);
        let mut candidate = template.candidate();
        candidate.nonce = nonce;
        candidate.mix_digest = out.mix_digest;

        let duration = start.elapsed();
        info!(
            height = template.height,
            nonce,
            hashes,
            duration_ms = duration.as_millis() as u64,
            "Seal found"
        );

        Ok(Solution {
            candidate,
            hashes_computed: hashes,
            duration,
        })
    }

    /// Search on a blocking task so the async caller can race it against
    /// head-change notifications.
    pub async fn search_async(&self, template: BlockTemplate) -> MiningResult<Solution> {
        let pool = self.clone_internals();
        tokio::task::spawn_blocking(move || pool.search(&template))
            .await
            .map_err(|_| MiningError::Cancelled)?
    }

    fn clone_internals(&self) -> WorkerPool {
        WorkerPool {
            config: self.config.clone(),
            cancelled: Arc::clone(&self.cancelled),
            total_hashes: Arc::clone(&self.total_hashes),
        }
    }
}
