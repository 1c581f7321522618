// Per-thread synchronous logging core
//
// Each thread owns a (ring buffer, sink) pair. A log macro gates on the
// global level, assembles one line in the calling thread's buffer, and
// flushes it to that thread's sink at end of line. See the module files
// for the cursor protocol and the sink rollover policy.

mod core;
mod digits;
mod level;
mod line;
#[macro_use]
mod macros;
mod ringbuffer;
mod sink;
mod time;

// Public exports
pub use self::core::{core, LogCore};
pub use level::Level;
pub use line::{LogField, LogLine, LogLoc};
pub use ringbuffer::{RingBuffer, DEFAULT_BUFFER_CAPACITY};
pub use sink::{LogSink, NullSink, RotatingFileSink, StdoutSink, DEFAULT_MAX_FILE_SIZE};
pub use time::{current_thread_id, local_tz_offset, SecondFraction, Time};

/// Serializes tests that mutate the global level gate.
#[cfg(test)]
pub(crate) fn level_test_guard() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    match GUARD.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
