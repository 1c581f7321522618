// Per-thread byte ring buffer for log line assembly
//
// One buffer exists per logging thread. The thread produces log line bytes
// into it and, in the synchronous logger, also consumes them at end of
// line. The cursor protocol still uses acquire/release ordering so that a
// future asynchronous consumer on another thread can reuse the buffer
// unchanged.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

/// Default capacity: 1 MiB
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Bounded FIFO byte queue with separate produce / consume / consumable
/// cursors.
///
/// The cursors are monotonically increasing and may wrap; a position maps
/// into storage as `pos & (capacity - 1)`. Invariant:
/// `consume_pos <= consumable_pos <= produce_pos` and
/// `produce_pos - consume_pos <= capacity`.
///
/// `consumable_pos` only advances when a completed log line has been
/// produced, so a consumer never observes a partial line.
pub struct RingBuffer {
    storage: Box<[UnsafeCell<u8>]>,
    produce_pos: AtomicU32,
    consume_pos: AtomicU32,
    consumable_pos: AtomicU32,
}

// SAFETY: RingBuffer is Sync because:
// - Only one thread produces (owner of the free range past produce_pos)
// - Only one thread consumes (owner of [consume_pos, consumable_pos))
// - The cursor protocol keeps the producer's and consumer's byte ranges
//   disjoint, and release/acquire pairs on the cursors order the copies
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Create a buffer with the default 1 MiB capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a buffer with the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is not a power of two or exceeds `u32::MAX`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "capacity must be a power of 2");
        assert!(capacity <= u32::MAX as usize);

        let storage: Vec<UnsafeCell<u8>> = (0..capacity).map(|_| UnsafeCell::new(0)).collect();

        Self {
            storage: storage.into_boxed_slice(),
            produce_pos: AtomicU32::new(0),
            consume_pos: AtomicU32::new(0),
            consumable_pos: AtomicU32::new(0),
        }
    }

    /// Buffer capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.storage.len() as u32
    }

    /// Bytes currently held (produced and not yet consumed).
    pub fn used(&self) -> u32 {
        let produce = self.produce_pos.load(Ordering::Acquire);
        let consume = self.consume_pos.load(Ordering::Acquire);
        produce.wrapping_sub(consume)
    }

    /// Free space in bytes.
    pub fn unused(&self) -> u32 {
        self.capacity() - self.used()
    }

    /// Bytes belonging to completed log lines, ready for the consumer.
    pub fn consumable(&self) -> u32 {
        let consumable = self.consumable_pos.load(Ordering::Acquire);
        let consume = self.consume_pos.load(Ordering::Relaxed);
        consumable.wrapping_sub(consume)
    }

    /// Publish `n` more bytes as a completed line.
    pub fn mark_consumable(&self, n: u32) {
        let consumable = self.consumable_pos.load(Ordering::Relaxed);
        self.consumable_pos
            .store(consumable.wrapping_add(n), Ordering::Release);
    }

    /// Copy `src` into the buffer, spinning while there is not enough free
    /// space. Inputs longer than the whole buffer are truncated to the
    /// capacity.
    ///
    /// Correct usage flushes every line synchronously, so the spin can only
    /// trigger when a single line approaches the buffer capacity.
    pub fn produce(&self, src: &[u8]) {
        let n = (src.len() as u32).min(self.capacity());
        while self.unused() < n {
            std::hint::spin_loop();
        }

        let produce = self.produce_pos.load(Ordering::Relaxed);
        let pos = (produce & (self.capacity() - 1)) as usize;
        let first = (n as usize).min(self.storage.len() - pos);

        // SAFETY: [produce, produce + n) is free space owned exclusively by
        // the producer (checked above); the two copies cover the tail of
        // storage and the wrapped head without overlap.
        unsafe {
            let base = self.storage.as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(src.as_ptr(), base.add(pos), first);
            std::ptr::copy_nonoverlapping(src.as_ptr().add(first), base, n as usize - first);
        }

        self.produce_pos
            .store(produce.wrapping_add(n), Ordering::Release);
    }

    /// Copy up to `dst.len()` consumable bytes into `dst`. Returns the
    /// number of bytes copied.
    pub fn consume(&self, dst: &mut [u8]) -> u32 {
        let avail = self.consumable().min(dst.len() as u32);
        if avail == 0 {
            return 0;
        }

        let consume = self.consume_pos.load(Ordering::Relaxed);
        let pos = (consume & (self.capacity() - 1)) as usize;
        let first = (avail as usize).min(self.storage.len() - pos);

        // SAFETY: [consume, consume + avail) holds published bytes owned
        // exclusively by the consumer; the acquire load in consumable()
        // ordered them after the producer's copies.
        unsafe {
            let base = self.storage.as_ptr() as *const u8;
            std::ptr::copy_nonoverlapping(base.add(pos), dst.as_mut_ptr(), first);
            std::ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), avail as usize - first);
        }

        self.consume_pos
            .store(consume.wrapping_add(avail), Ordering::Release);
        avail
    }

    /// Reset all cursors to zero. Called by the synchronous logger after a
    /// successful flush, when the buffer is known to be drained.
    pub fn reset(&self) {
        self.produce_pos.store(0, Ordering::Release);
        self.consume_pos.store(0, Ordering::Release);
        self.consumable_pos.store(0, Ordering::Release);
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
