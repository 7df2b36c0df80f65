//! Tuning constants shared across the harness.
//!
//! Everything here feeds [`crate::BenchConfig`] defaults; nothing reads these
//! at measurement time, so a run's behavior is fixed once its configuration
//! is built.

use std::time::Duration;

/// Upper bound for a single mapping window, strictly below 2 GiB.
///
/// Containers larger than this are covered by a sequence of bounded windows;
/// a frame must always fit wholly inside one window.
pub const MAX_WINDOW_BYTES: u64 = 2_000_000_000;

/// Page stride used by the touch probe and the prefault phase.
pub const PAGE_BYTES: usize = 4096;

/// Default busy-loop duration for the CPU warm-up phase.
pub const DEFAULT_CPU_WARMUP: Duration = Duration::from_millis(150);

/// Default pause after a drain flush, letting writeback settle before the
/// next phase is timed.
pub const DEFAULT_DRAIN_SLEEP: Duration = Duration::from_millis(500);

/// Default pixel depth in bytes (16-bit pixels).
pub const DEFAULT_BYTES_PER_PIXEL: u32 = 2;

/// Default number of measured trials per run.
pub const DEFAULT_TRIALS: u32 = 5;
