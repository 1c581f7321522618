// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Concurrent benchmark harness.
//!
//! Drives synthetic insert and search workloads against one list through
//! a [`WorkerPool`]. Each pass splits the configured operation count
//! evenly across the workers and blocks on a [`CompletionLatch`] until
//! every task has finished.

use crate::config::BenchmarkToggles;
use crate::log_info;
use crate::pool::{CompletionLatch, WorkerPool};
use crate::skiplist::SkipList;
use anyhow::{ensure, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// CLI data volumes are given in millions of operations.
pub const OPS_PER_MILLION: u64 = 1_000_000;

/// One benchmark run configuration
#[derive(Debug, Clone, Copy)]
pub struct BenchOptions {
    pub threads: usize,
    /// Total operations per pass; also the exclusive upper bound of the
    /// random key range.
    pub keys: u64,
    pub max_level: usize,
    pub toggles: BenchmarkToggles,
}

/// Timing result of one pass
#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    pub operations: u64,
    pub elapsed: Duration,
    pub qps: f64,
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Insert,
    Search,
}

impl Pass {
    fn name(self) -> &'static str {
        match self {
            Pass::Insert => "insert",
            Pass::Search => "search",
        }
    }
}

/// Minimal xorshift64 generator, the non-`rand` workload driver.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9e3779b97f4a7c15 } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Per-worker key generator, selected by `useRandRNG`.
enum WorkloadRng {
    Rand(SmallRng),
    Xorshift(Xorshift64),
}

impl WorkloadRng {
    fn new(use_rand_rng: bool, seed: u64) -> Self {
        if use_rand_rng {
            WorkloadRng::Rand(SmallRng::seed_from_u64(seed))
        } else {
            WorkloadRng::Xorshift(Xorshift64::new(seed))
        }
    }

    fn next_key(&mut self, bound: u64) -> u64 {
        match self {
            WorkloadRng::Rand(rng) => rng.gen_range(0..bound),
            WorkloadRng::Xorshift(rng) => rng.next() % bound,
        }
    }
}

/// Run the insert pass followed by the search pass on a fresh list.
pub fn run(options: &BenchOptions) -> Result<(BenchReport, BenchReport)> {
    validate(options)?;

    let list: Arc<SkipList<i64, String>> = Arc::new(SkipList::new(options.max_level));
    if !list.is_empty() {
        list.clear();
    }

    let insert = run_pass(&list, options, Pass::Insert)?;
    let search = run_pass(&list, options, Pass::Search)?;
    Ok((insert, search))
}

fn validate(options: &BenchOptions) -> Result<()> {
    ensure!(options.threads >= 1, "benchmark needs at least one thread");
    ensure!(
        options.keys >= options.threads as u64,
        "operation count below thread count"
    );
    Ok(())
}

fn run_pass(
    list: &Arc<SkipList<i64, String>>,
    options: &BenchOptions,
    pass: Pass,
) -> Result<BenchReport> {
    let pool = WorkerPool::new(options.threads);
    let latch = Arc::new(CompletionLatch::new(options.threads as u64));
    let per_worker = options.keys / options.threads as u64;
    let bound = options.keys;
    let toggles = options.toggles;

    let started = Instant::now();
    for tid in 0..options.threads {
        let list = Arc::clone(list);
        let latch = Arc::clone(&latch);
        pool.submit(move || {
            let mut rng =
                WorkloadRng::new(toggles.use_rand_rng, (tid as u64 + 1) ^ started_seed());
            let progress_step = (per_worker / 10).max(1);
            for done in 0..per_worker {
                let key = rng.next_key(bound) as i64;
                match pass {
                    Pass::Insert => {
                        list.insert(key, "a".to_string());
                    }
                    Pass::Search => {
                        list.search(&key);
                    }
                }
                if toggles.use_progress_bar && (done + 1) % progress_step == 0 {
                    log_info!(
                        pass.name(),
                        " worker ",
                        tid,
                        ": ",
                        done + 1,
                        "/",
                        per_worker,
                    );
                }
            }
            latch.arrive();
        })?;
    }

    latch.wait();
    let elapsed = started.elapsed();

    let operations = per_worker * options.threads as u64;
    let qps = operations as f64 / elapsed.as_secs_f64();
    log_info!(
        pass.name(),
        " pass finished: ",
        operations,
        " ops, qps ",
        qps as u64,
    );
    Ok(BenchReport {
        operations,
        elapsed,
        qps,
    })
}

/// Per-process seed component so repeated runs do not replay one key
/// sequence.
fn started_seed() -> u64 {
    use std::sync::OnceLock;
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        use rand::rngs::OsRng;
        OsRng.gen()
    })
}
