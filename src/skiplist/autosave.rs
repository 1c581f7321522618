// Background periodic snapshot actor

use super::{SkipList, Snapshotter};
use crate::{log_debug, log_error};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often the worker re-checks the stop flag while sleeping out an
/// interval; bounds shutdown latency well below one interval.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns a background thread that snapshots a list every `interval` under
/// `<basename>_autosave` until the actor is dropped.
///
/// The actor exclusively owns its worker; it is deliberately neither
/// `Clone` nor copyable. Dropping it raises the stop flag and joins the
/// worker.
pub struct AutoSaveActor {
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AutoSaveActor {
    pub fn spawn<K, V>(
        list: Arc<SkipList<K, V>>,
        snapshotter: Snapshotter,
        basename: impl Into<String>,
        interval: Duration,
    ) -> Self
    where
        K: Ord + Default + Clone + Serialize + Send + 'static,
        V: Default + Clone + Serialize + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let basename = format!("{}_autosave", basename.into());

        let worker = thread::spawn(move || loop {
            let deadline = Instant::now() + interval;
            loop {
                if flag.load(Ordering::Relaxed) {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
            }

            // Save errors must not kill the worker; the next tick retries.
            match snapshotter.save(&list, &basename) {
                Ok(path) => {
                    log_debug!("autosave written: ", path.display().to_string());
                }
                Err(err) => {
                    log_error!("autosave failed: ", err.to_string());
                }
            }
        });

        Self {
            stop,
            worker: Some(worker),
        }
    }
}

impl Drop for AutoSaveActor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
