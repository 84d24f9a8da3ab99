//! Global admission gate shared by page fetches and song downloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The gate's semaphore was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency gate closed")]
pub struct GateClosed;

/// Bounds how many tasks of any kind run their gated section at once.
///
/// Backed by a semaphore, so waiters get no FIFO guarantee. Cloning is cheap
/// and every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    /// Creates a gate admitting at most `max` tasks (at least one).
    #[must_use]
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free slot and admits the caller.
    ///
    /// The slot is returned when the [`GatePermit`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GateClosed`] if the underlying semaphore was closed.
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GatePermit {
            in_flight: Arc::clone(&self.in_flight),
            _permit: permit,
        })
    }

    /// Configured maximum.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Tasks currently admitted.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously admitted tasks seen so far.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// One admission slot; released on drop.
#[derive(Debug)]
pub struct GatePermit {
    in_flight: Arc<AtomicUsize>,
    // Dropped after `Drop::drop` runs, so the count falls before the slot frees.
    _permit: OwnedSemaphorePermit,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
