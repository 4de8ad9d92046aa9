//! Time and memory sampling
//!
//! The monitor never reads the system clock or process memory directly; it
//! goes through the [`Clock`] and [`MemorySampler`] traits so tests can
//! substitute deterministic sources and assert exact durations and deltas.
//!
//! The default memory sampler reads a process-wide tracked-allocation
//! counter. Subsystems that want their allocations reflected in operation
//! records call [`track_allocation`] / [`track_release`] around their large
//! buffers; everything else sees a stable baseline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Monotonic time source reporting milliseconds
pub trait Clock: Send + Sync {
    /// Current timestamp in milliseconds since an arbitrary origin
    fn now_ms(&self) -> f64;
}

/// Reports current memory usage in bytes
pub trait MemorySampler: Send + Sync {
    fn current_bytes(&self) -> u64;
}

/// Default clock: milliseconds elapsed since construction
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Global memory tracking (updated by subsystems that track their allocations)
static TRACKED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Record `size` bytes as allocated
pub fn track_allocation(size: u64) {
    TRACKED_BYTES.fetch_add(size, Ordering::Relaxed);
}

/// Record `size` bytes as released; saturates at zero
pub fn track_release(size: u64) {
    let _ = TRACKED_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bytes| {
        Some(bytes.saturating_sub(size))
    });
}

/// Currently tracked allocation total in bytes
pub fn tracked_bytes() -> u64 {
    TRACKED_BYTES.load(Ordering::Relaxed)
}

/// Default sampler backed by the tracked-allocation counter
#[derive(Debug, Default)]
pub struct TrackedMemory;

impl MemorySampler for TrackedMemory {
    fn current_bytes(&self) -> u64 {
        tracked_bytes()
    }
}

/// Manually driven clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Mutex<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current timestamp
    pub fn set(&self, ms: f64) {
        *self.now_ms.lock().unwrap_or_else(PoisonError::into_inner) = ms;
    }

    /// Move the clock forward
    pub fn advance(&self, ms: f64) {
        *self.now_ms.lock().unwrap_or_else(PoisonError::into_inner) += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now_ms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Manually driven memory sampler for deterministic tests
#[derive(Debug, Default)]
pub struct ManualMemory {
    bytes: AtomicU64,
}

impl ManualMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported memory usage
    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }
}

impl MemorySampler for ManualMemory {
    fn current_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
