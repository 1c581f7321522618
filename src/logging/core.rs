// Process-global logging state and the per-thread synchronous logger

use super::ringbuffer::RingBuffer;
use super::sink::{LogSink, StdoutSink};
use super::Level;
use std::cell::OnceCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Per-thread logger: a ring buffer plus the sink it flushes to.
///
/// Created lazily on a thread's first log call and registered with the
/// global core. The buffer is produced and consumed by the owning thread;
/// the sink handle may be swapped by `LogCore::set_sink`.
pub(crate) struct ThreadLogger {
    buffer: RingBuffer,
    sink: Mutex<Arc<dyn LogSink>>,
}

impl ThreadLogger {
    fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            buffer: RingBuffer::new(),
            sink: Mutex::new(sink),
        }
    }

    fn produce(&self, bytes: &[u8]) {
        self.buffer.produce(bytes);
    }

    /// Publish the trailing `n` bytes, hand the whole ready region to the
    /// sink, and reset the buffer for the next line.
    fn flush(&self, n: u32) {
        self.buffer.mark_consumable(n);
        let ready = self.buffer.consumable() as usize;
        let mut out = vec![0u8; ready];
        let copied = self.buffer.consume(&mut out) as usize;

        let sink = Arc::clone(&self.sink.lock().unwrap());
        sink.write(&out[..copied]);

        self.buffer.reset();
    }

    fn set_sink(&self, sink: Arc<dyn LogSink>) {
        *self.sink.lock().unwrap() = sink;
    }
}

/// Process-global logging core: the level gate, the default sink for new
/// per-thread loggers, and the registry that keeps every thread's logger
/// alive until process exit.
pub struct LogCore {
    level: AtomicU8,
    default_sink: Mutex<Arc<dyn LogSink>>,
    loggers: Mutex<Vec<Arc<ThreadLogger>>>,
}

/// The global core, created on first use.
pub fn core() -> &'static LogCore {
    static CORE: OnceLock<LogCore> = OnceLock::new();
    CORE.get_or_init(LogCore::new)
}

impl LogCore {
    fn new() -> Self {
        Self {
            level: AtomicU8::new(Level::Info.as_u8()),
            default_sink: Mutex::new(Arc::new(StdoutSink)),
            loggers: Mutex::new(Vec::new()),
        }
    }

    /// Current level gate. Calls below this level are no-ops.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Replace the default sink for loggers created after this call and,
    /// additionally, the sink of the calling thread's existing logger.
    ///
    /// Loggers already created on other threads keep the sink they were
    /// created with.
    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        *self.default_sink.lock().unwrap() = Arc::clone(&sink);
        self.with_thread_logger(|logger| logger.set_sink(sink));
    }

    /// Append bytes to the calling thread's in-flight log line.
    pub fn produce(&self, bytes: &[u8]) {
        self.with_thread_logger(|logger| logger.produce(bytes));
    }

    /// Flush a completed line of `n` bytes through the calling thread's
    /// sink.
    pub fn flush(&self, n: u32) {
        self.with_thread_logger(|logger| logger.flush(n));
    }

    /// Number of per-thread loggers created so far.
    pub fn logger_count(&self) -> usize {
        self.loggers.lock().unwrap().len()
    }

    fn with_thread_logger<R>(&self, f: impl FnOnce(&ThreadLogger) -> R) -> R {
        thread_local! {
            static LOGGER: OnceCell<Arc<ThreadLogger>> = const { OnceCell::new() };
        }
        LOGGER.with(|cell| {
            let logger = cell.get_or_init(|| {
                let sink = Arc::clone(&self.default_sink.lock().unwrap());
                let logger = Arc::new(ThreadLogger::new(sink));
                // Registration is the only cross-thread access to the set.
                self.loggers.lock().unwrap().push(Arc::clone(&logger));
                logger
            });
            f(logger)
        })
    }
}
