//! Shared crawl counters.
//!
//! Each counter is an independent atomic; no invariant spans two of them, so
//! there is no lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Counters updated concurrently by the coordinator, page tasks and item tasks.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_dispatched: AtomicU64,
    pages_with_songs: AtomicU64,
    empty_pages: AtomicU64,
    failed_pages: AtomicU64,
    consecutive_empty_pages: AtomicU32,
    songs_discovered: AtomicU64,
    downloads_completed: AtomicU64,
    downloads_failed: AtomicU64,
}

impl CrawlStats {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one page handed to a page task.
    pub fn record_page_dispatched(&self) {
        self.pages_dispatched.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts an empty page and extends the empty streak.
    ///
    /// Returns the streak length after this page.
    pub fn record_empty_page(&self) -> u32 {
        self.empty_pages.fetch_add(1, Ordering::SeqCst);
        self.consecutive_empty_pages.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Counts a page with `songs` entries and resets the empty streak.
    pub fn record_songs_page(&self, songs: usize) {
        self.consecutive_empty_pages.store(0, Ordering::SeqCst);
        self.pages_with_songs.fetch_add(1, Ordering::SeqCst);
        self.songs_discovered
            .fetch_add(u64::try_from(songs).unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    /// Counts a page whose fetch or decode failed. The empty streak is untouched.
    pub fn record_failed_page(&self) {
        self.failed_pages.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a finished download.
    pub fn record_download_completed(&self) {
        self.downloads_completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts an abandoned download.
    pub fn record_download_failed(&self) {
        self.downloads_failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Current run of consecutive empty pages.
    #[must_use]
    pub fn consecutive_empty_pages(&self) -> u32 {
        self.consecutive_empty_pages.load(Ordering::SeqCst)
    }

    /// Pages dispatched so far.
    #[must_use]
    pub fn pages_dispatched(&self) -> u64 {
        self.pages_dispatched.load(Ordering::SeqCst)
    }

    /// Pages that returned at least one song.
    #[must_use]
    pub fn pages_with_songs(&self) -> u64 {
        self.pages_with_songs.load(Ordering::SeqCst)
    }

    /// Pages that returned no songs.
    #[must_use]
    pub fn empty_pages(&self) -> u64 {
        self.empty_pages.load(Ordering::SeqCst)
    }

    /// Pages that failed to fetch or decode.
    #[must_use]
    pub fn failed_pages(&self) -> u64 {
        self.failed_pages.load(Ordering::SeqCst)
    }

    /// Songs found across all pages.
    #[must_use]
    pub fn songs_discovered(&self) -> u64 {
        self.songs_discovered.load(Ordering::SeqCst)
    }

    /// Downloads written to disk.
    #[must_use]
    pub fn downloads_completed(&self) -> u64 {
        self.downloads_completed.load(Ordering::SeqCst)
    }

    /// Downloads that failed.
    #[must_use]
    pub fn downloads_failed(&self) -> u64 {
        self.downloads_failed.load(Ordering::SeqCst)
    }
}
