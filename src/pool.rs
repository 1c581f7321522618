// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Fixed-size worker-thread pool with a FIFO task queue.
//!
//! Tasks are erased nullary closures; the pool never observes their
//! results. Callers that need a completion signal pair submissions with a
//! [`CompletionLatch`].

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use thiserror::Error;

use crate::log_debug;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Errors surfaced to task submitters
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has begun stopping; the task was not enqueued.
    #[error("submit on a stopping worker pool")]
    Shutdown,
}

struct QueueState {
    tasks: VecDeque<Task>,
    stop: bool,
}

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
}

/// Pool of worker threads draining a synchronized FIFO of closures.
///
/// Tasks run in submission order per producer, possibly concurrently on
/// distinct workers; closures provide their own synchronization. Dropping
/// the pool stops it: the stop flag is raised, all waiters are woken, the
/// remaining queue is drained, and every worker is joined.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool of `n_workers` threads.
    ///
    /// # Panics
    /// Panics if `n_workers` is zero.
    pub fn new(n_workers: usize) -> Self {
        assert!(n_workers >= 1, "worker pool needs at least one thread");

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
        });

        let workers = (0..n_workers)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(&shared))
            })
            .collect();

        log_debug!("worker pool started with ", n_workers, " workers");
        Self { shared, workers }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a task. Fails once the pool has begun stopping.
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut queue = self.shared.queue.lock().unwrap();
            if queue.stop {
                return Err(PoolError::Shutdown);
            }
            queue.tasks.push_back(Box::new(task));
        }
        self.shared.available.notify_one();
        Ok(())
    }

    /// Stop the pool: raise the stop flag, wake all workers, and join them
    /// after the queue drains. Idempotent; also run by `Drop`.
    pub fn shutdown(&mut self) {
        {
            let mut queue = self.shared.queue.lock().unwrap();
            queue.stop = true;
        }
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let queue = shared.queue.lock().unwrap();
            let mut queue = shared
                .available
                .wait_while(queue, |state| !state.stop && state.tasks.is_empty())
                .unwrap();
            if queue.stop && queue.tasks.is_empty() {
                return;
            }
            queue.tasks.pop_front().unwrap()
        };
        // Run outside the lock so workers execute concurrently.
        task();
    }
}

/// Counter barrier for "all N tasks done" fan-in.
///
/// Every task calls [`arrive`](Self::arrive) when finished; a waiter blocks
/// in [`wait`](Self::wait) until the counter reaches the target.
pub struct CompletionLatch {
    target: u64,
    done: Mutex<u64>,
    all_done: Condvar,
}

impl CompletionLatch {
    pub fn new(target: u64) -> Self {
        Self {
            target,
            done: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    /// Record one finished task.
    pub fn arrive(&self) {
        let mut done = self.done.lock().unwrap();
        *done += 1;
        if *done >= self.target {
            self.all_done.notify_all();
        }
    }

    /// Block until `target` tasks have arrived.
    pub fn wait(&self) {
        let done = self.done.lock().unwrap();
        let _done = self
            .all_done
            .wait_while(done, |done| *done < self.target)
            .unwrap();
    }

    /// Tasks arrived so far.
    pub fn count(&self) -> u64 {
        *self.done.lock().unwrap()
    }
}
