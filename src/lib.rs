// SPDX-License-Identifier: Apache-2.0 OR MIT
//! In-process ordered key-value index on a probabilistic skip list.
//!
//! The crate bundles three tightly-coupled subsystems:
//! - the ordered index itself ([`skiplist`]), with JSON snapshot
//!   persistence and a background autosave actor;
//! - a bounded worker-thread pool ([`pool`]) used by the benchmark
//!   harness ([`benchmark`]);
//! - a per-thread synchronous logging core ([`logging`]) built on a
//!   lock-free ring buffer and a pluggable output sink.

pub mod benchmark;
pub mod config;
pub mod console;
pub mod logging;
pub mod pool;
pub mod skiplist;

pub use config::{BenchmarkToggles, Config, ConfigError};
pub use console::Console;
pub use pool::{CompletionLatch, PoolError, WorkerPool};
pub use skiplist::{
    load_snapshot, AutoSaveActor, InsertOutcome, LoadOutcome, SkipList, SnapshotError, Snapshotter,
};
