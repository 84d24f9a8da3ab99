//! Download throughput accounting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Running total of downloaded bytes since the crawl started.
#[derive(Debug)]
pub struct ThroughputMeter {
    started: Instant,
    total_bytes: AtomicU64,
}

/// Snapshot taken when one download finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    /// Bytes downloaded across all songs so far, this one included.
    pub total_bytes: u64,
    /// Average rate since the crawl started, in MiB/s.
    pub average_mib_per_sec: f64,
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThroughputMeter {
    /// Starts the clock now.
    #[must_use]
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Starts the clock at `started`.
    #[must_use]
    pub fn started_at(started: Instant) -> Self {
        Self {
            started,
            total_bytes: AtomicU64::new(0),
        }
    }

    /// Adds a finished transfer and returns the running average.
    pub fn record(&self, bytes: u64) -> ThroughputSample {
        let total_bytes = self.total_bytes.fetch_add(bytes, Ordering::SeqCst) + bytes;
        ThroughputSample {
            total_bytes,
            average_mib_per_sec: mib_per_sec(total_bytes, self.started.elapsed()),
        }
    }

    /// Bytes downloaded so far.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }
}

/// Converts a byte count to MiB.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Rate in MiB/s; zero when no time has elapsed.
#[must_use]
pub fn mib_per_sec(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { to_mib(bytes) / secs } else { 0.0 }
}
