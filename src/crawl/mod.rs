//! Crawl coordinator: dispatches page tasks under a shared concurrency gate.
//!
//! # Overview
//!
//! The [`Crawler`] walks page indices in ascending order. For every page it
//! waits for a gate slot, then spawns a page task that holds that slot while
//! it fetches the page and hands the songs to the log. With downloads
//! enabled each song gets its own item task, which waits for a slot of the
//! same gate before touching the network.
//!
//! Dispatch stops at the first of:
//! - the exclusive upper page bound,
//! - an interrupt ([`CancellationToken`] cancelled),
//! - more than [`EMPTY_PAGE_THRESHOLD`] consecutive empty pages.
//!
//! Every task already dispatched runs to completion. The log is then closed
//! and its backlog flushed before [`Crawler::run`] returns a
//! [`CrawlSummary`]. A failing log aborts the crawl with
//! [`CrawlError::Sink`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crawler_core::{CatalogClient, CrawlConfig, Crawler, HttpClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrawlConfig::new(0, 50, 4)?.with_downloads("Downloads");
//! let source = Arc::new(CatalogClient::new(crawler_core::DEFAULT_LISTING_URL)?);
//! let crawler = Crawler::new(config, source, HttpClient::new());
//!
//! let summary = crawler.run(CancellationToken::new()).await?;
//! println!("{} songs logged", summary.records_written);
//! # Ok(())
//! # }
//! ```

mod gate;
mod item_task;
mod page_task;
mod stats;
mod throughput;

pub use gate::{ConcurrencyGate, GateClosed, GatePermit};
pub use stats::CrawlStats;
pub use throughput::{ThroughputMeter, ThroughputSample, mib_per_sec, to_mib};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, trace};

use crate::catalog::PageSource;
use crate::config::CrawlConfig;
use crate::download::HttpClient;
use crate::sink::{ItemSink, SinkError, SongSender};

/// Dispatch stops once the empty streak is strictly above this value.
pub const EMPTY_PAGE_THRESHOLD: u32 = 100;

/// Errors that end a crawl.
///
/// Page and download failures are not here: they are logged, counted in the
/// [`CrawlSummary`], and the crawl carries on.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The download directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The song log could not be opened, written or flushed.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The song log writer ended while songs could still arrive.
    #[error("song log writer stopped before the crawl finished")]
    SinkStopped,

    /// The concurrency gate was closed under the coordinator.
    #[error(transparent)]
    GateClosed(#[from] GateClosed),
}

/// Why the coordinator stopped dispatching pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every page index below the upper bound was dispatched.
    PageLimit,
    /// An interrupt arrived.
    Interrupted,
    /// Too many consecutive empty pages; the listing looks exhausted.
    Exhausted,
}

/// Outcome of a finished crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Why dispatch stopped.
    pub stop_reason: StopReason,
    /// Page tasks started.
    pub pages_dispatched: u64,
    /// Pages that returned songs.
    pub pages_with_songs: u64,
    /// Pages that returned no songs.
    pub empty_pages: u64,
    /// Pages that failed to fetch or decode.
    pub failed_pages: u64,
    /// Empty streak when the crawl ended.
    pub consecutive_empty_pages: u32,
    /// Songs found across all pages.
    pub songs_discovered: u64,
    /// Records appended to the song log.
    pub records_written: u64,
    /// Songs downloaded.
    pub downloads_completed: u64,
    /// Downloads that failed.
    pub downloads_failed: u64,
    /// Payload bytes written by completed downloads.
    pub bytes_downloaded: u64,
    /// Most tasks ever admitted by the gate at once.
    pub peak_concurrency: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Whether the crawl stopped on an interrupt.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.stop_reason == StopReason::Interrupted
    }

    /// Whether the crawl stopped because the listing ran out.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.stop_reason == StopReason::Exhausted
    }
}

/// Where and how item tasks download.
#[derive(Debug)]
pub(crate) struct DownloadTarget {
    pub(crate) client: HttpClient,
    pub(crate) output_dir: PathBuf,
}

/// State shared by the coordinator and every task of one run.
///
/// Holds the only long-lived [`SongSender`]; the log closes once the
/// coordinator and all tasks have dropped their handle to this.
pub(crate) struct CrawlContext {
    pub(crate) source: Arc<dyn PageSource>,
    pub(crate) songs: SongSender,
    pub(crate) gate: ConcurrencyGate,
    pub(crate) tracker: TaskTracker,
    pub(crate) stats: CrawlStats,
    pub(crate) throughput: ThroughputMeter,
    pub(crate) downloads: Option<DownloadTarget>,
}

/// Drives one crawl over a [`PageSource`].
pub struct Crawler {
    config: CrawlConfig,
    source: Arc<dyn PageSource>,
    client: HttpClient,
}

impl Crawler {
    /// Creates a crawler. `client` is only used when downloads are enabled.
    #[must_use]
    pub fn new(config: CrawlConfig, source: Arc<dyn PageSource>, client: HttpClient) -> Self {
        Self {
            config,
            source,
            client,
        }
    }

    /// Runs the crawl until a stop condition, then drains all tasks and the log.
    ///
    /// `cancel` is the interrupt: once cancelled no further page is
    /// dispatched, but pages and downloads already started finish.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::OutputDir`] if the download directory cannot be
    /// created and [`CrawlError::Sink`] if the song log fails at any point.
    #[instrument(skip_all, fields(
        min = self.config.min_page(),
        max = self.config.max_page(),
        conns = self.config.concurrency(),
    ))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlSummary, CrawlError> {
        let started = Instant::now();

        let downloads = if self.config.download() {
            let output_dir = self.config.output_dir().to_path_buf();
            tokio::fs::create_dir_all(&output_dir)
                .await
                .map_err(|source| CrawlError::OutputDir {
                    path: output_dir.clone(),
                    source,
                })?;
            Some(DownloadTarget {
                client: self.client.clone(),
                output_dir,
            })
        } else {
            None
        };

        let (songs, mut sink) =
            ItemSink::spawn(self.config.log_file(), self.config.sink_capacity()).await?;

        let ctx = Arc::new(CrawlContext {
            source: Arc::clone(&self.source),
            songs,
            gate: ConcurrencyGate::new(self.config.concurrency()),
            tracker: TaskTracker::new(),
            stats: CrawlStats::new(),
            throughput: ThroughputMeter::started_at(started),
            downloads,
        });

        info!(
            download = self.config.download(),
            log_file = %sink.path().display(),
            "starting crawl"
        );

        let stop_reason = tokio::select! {
            result = &mut sink => {
                // Senders are still alive here, so the writer only ends on failure.
                return Err(match result {
                    Err(e) => CrawlError::Sink(e),
                    Ok(_) => CrawlError::SinkStopped,
                });
            }
            stop = self.dispatch_and_drain(&ctx, &cancel) => stop?,
        };

        let stats = &ctx.stats;
        let mut summary = CrawlSummary {
            stop_reason,
            pages_dispatched: stats.pages_dispatched(),
            pages_with_songs: stats.pages_with_songs(),
            empty_pages: stats.empty_pages(),
            failed_pages: stats.failed_pages(),
            consecutive_empty_pages: stats.consecutive_empty_pages(),
            songs_discovered: stats.songs_discovered(),
            records_written: 0,
            downloads_completed: stats.downloads_completed(),
            downloads_failed: stats.downloads_failed(),
            bytes_downloaded: ctx.throughput.total_bytes(),
            peak_concurrency: ctx.gate.peak(),
            elapsed: Duration::ZERO,
        };

        // Last sender goes with the context; the writer drains and flushes.
        drop(ctx);
        summary.records_written = sink.await?;
        summary.elapsed = started.elapsed();

        info!(
            stop_reason = ?summary.stop_reason,
            pages = summary.pages_dispatched,
            failed_pages = summary.failed_pages,
            songs = summary.records_written,
            downloads = summary.downloads_completed,
            failed_downloads = summary.downloads_failed,
            "crawl finished"
        );
        Ok(summary)
    }

    async fn dispatch_and_drain(
        &self,
        ctx: &Arc<CrawlContext>,
        cancel: &CancellationToken,
    ) -> Result<StopReason, CrawlError> {
        let stop = self.dispatch_pages(ctx, cancel).await;

        ctx.tracker.close();
        debug!(
            outstanding = ctx.tracker.len(),
            "dispatch stopped, waiting for outstanding tasks"
        );
        ctx.tracker.wait().await;

        stop
    }

    async fn dispatch_pages(
        &self,
        ctx: &Arc<CrawlContext>,
        cancel: &CancellationToken,
    ) -> Result<StopReason, CrawlError> {
        for page in self.config.min_page()..self.config.max_page() {
            if let Some(stop) = stop_condition(ctx, cancel) {
                return Ok(stop);
            }

            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(StopReason::Interrupted),
                permit = ctx.gate.acquire() => permit?,
            };

            // The streak may have grown while we waited for the slot.
            if let Some(stop) = stop_condition(ctx, cancel) {
                return Ok(stop);
            }

            ctx.stats.record_page_dispatched();
            trace!(page, "dispatching page");
            ctx.tracker
                .spawn(page_task::fetch_page(Arc::clone(ctx), page, permit));
        }

        Ok(StopReason::PageLimit)
    }
}

fn stop_condition(ctx: &CrawlContext, cancel: &CancellationToken) -> Option<StopReason> {
    if cancel.is_cancelled() {
        Some(StopReason::Interrupted)
    } else if ctx.stats.consecutive_empty_pages() > EMPTY_PAGE_THRESHOLD {
        Some(StopReason::Exhausted)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) fn test_context(
    source: impl PageSource + 'static,
    songs: SongSender,
    concurrency: usize,
) -> Arc<CrawlContext> {
    Arc::new(CrawlContext {
        source: Arc::new(source),
        songs,
        gate: ConcurrencyGate::new(concurrency),
        tracker: TaskTracker::new(),
        stats: CrawlStats::new(),
        throughput: ThroughputMeter::new(),
        downloads: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::{CatalogError, Page};
    use crate::sink::read_log;
    use crate::test_support::scripted_source::{ScriptedSource, songs_for_page};

    fn config(temp_dir: &TempDir, min: u32, max: u32, conns: usize) -> CrawlConfig {
        CrawlConfig::new(min, max, conns)
            .unwrap()
            .with_log_file(temp_dir.path().join("songs.csv"))
    }

    fn crawler(config: CrawlConfig, source: Arc<dyn PageSource>) -> Crawler {
        Crawler::new(config, source, HttpClient::new())
    }

    /// Cancels `token` the moment `page` is requested.
    struct CancelOnPage {
        inner: ScriptedSource,
        page: u32,
        token: CancellationToken,
    }

    #[async_trait]
    impl PageSource for CancelOnPage {
        async fn fetch_page(&self, index: u32) -> Result<Page, CatalogError> {
            if index == self.page {
                self.token.cancel();
            }
            self.inner.fetch_page(index).await
        }
    }

    #[tokio::test]
    async fn test_run_logs_every_song_of_the_range() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(
            ScriptedSource::new()
                .with_song_count(0, 1)
                .with_song_count(1, 2),
        );

        let summary = crawler(config(&temp_dir, 0, 2, 1), source.clone())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::PageLimit);
        assert_eq!(summary.pages_dispatched, 2);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.consecutive_empty_pages, 0);
        assert_eq!(source.requested(), vec![0, 1]);

        let mut expected = songs_for_page(0, 1);
        expected.extend(songs_for_page(1, 2));
        assert_eq!(read_log(&temp_dir.path().join("songs.csv")).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_run_never_requests_pages_outside_range() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new().with_song_count(4, 1));

        let summary = crawler(config(&temp_dir, 3, 6, 2), source.clone())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(source.requested(), vec![3, 4, 5]);
        assert_eq!(summary.empty_pages, 2);
        assert_eq!(summary.consecutive_empty_pages, 1);
        assert_eq!(summary.records_written, 1);
    }

    #[tokio::test]
    async fn test_run_with_empty_range_dispatches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new().with_song_count(5, 1));

        let summary = crawler(config(&temp_dir, 5, 5, 2), source.clone())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::PageLimit);
        assert_eq!(summary.pages_dispatched, 0);
        assert_eq!(summary.records_written, 0);
        assert!(source.requested().is_empty());
        assert!(read_log(&temp_dir.path().join("songs.csv")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_after_threshold_empty_pages() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new());

        let summary = crawler(config(&temp_dir, 0, 9999, 1), source.clone())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert!(summary.exhausted());
        assert_eq!(summary.pages_dispatched, u64::from(EMPTY_PAGE_THRESHOLD) + 1);
        assert_eq!(summary.records_written, 0);
    }

    #[tokio::test]
    async fn test_run_threshold_overshoot_bounded_by_concurrency() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new().with_delay(Duration::from_millis(1)));

        let summary = crawler(config(&temp_dir, 0, 9999, 4), source)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert!(summary.exhausted());
        let floor = u64::from(EMPTY_PAGE_THRESHOLD) + 1;
        assert!(
            (floor..floor + 4).contains(&summary.pages_dispatched),
            "dispatched {} pages",
            summary.pages_dispatched
        );
    }

    #[tokio::test]
    async fn test_songs_page_resets_empty_streak() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new().with_song_count(50, 2));

        let summary = crawler(config(&temp_dir, 0, 9999, 1), source)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert!(summary.exhausted());
        assert_eq!(summary.pages_dispatched, 51 + u64::from(EMPTY_PAGE_THRESHOLD) + 1);
        assert_eq!(summary.records_written, 2);
    }

    #[tokio::test]
    async fn test_failed_pages_do_not_count_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::new();
        for page in 0..5 {
            source = source.with_failure(page, 503);
        }

        let summary = crawler(config(&temp_dir, 0, 9999, 1), Arc::new(source))
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.failed_pages, 5);
        assert_eq!(summary.pages_dispatched, 5 + u64::from(EMPTY_PAGE_THRESHOLD) + 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::new().with_song_count(0, 3));
        let token = CancellationToken::new();
        token.cancel();

        let summary = crawler(config(&temp_dir, 0, 100, 4), source.clone())
            .run(token)
            .await
            .unwrap();

        assert!(summary.interrupted());
        assert_eq!(summary.pages_dispatched, 0);
        assert_eq!(summary.records_written, 0);
        assert!(source.requested().is_empty());
        assert!(temp_dir.path().join("songs.csv").exists());
    }

    #[tokio::test]
    async fn test_interrupt_finishes_dispatched_pages_only() {
        let temp_dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        let mut inner = ScriptedSource::new();
        for page in 0..10 {
            inner = inner.with_song_count(page, 1);
        }
        let source = Arc::new(CancelOnPage {
            inner,
            page: 2,
            token: token.clone(),
        });

        let summary = crawler(config(&temp_dir, 0, 10, 1), source)
            .run(token)
            .await
            .unwrap();

        assert!(summary.interrupted());
        assert_eq!(summary.pages_dispatched, 3);
        assert_eq!(summary.records_written, 3);
        assert_eq!(read_log(&temp_dir.path().join("songs.csv")).unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_peak_concurrency_within_limit() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::new().with_delay(Duration::from_millis(5));
        for page in 0..40 {
            source = source.with_song_count(page, 2);
        }

        let summary = crawler(config(&temp_dir, 0, 40, 3), Arc::new(source))
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert!(summary.peak_concurrency >= 1);
        assert!(summary.peak_concurrency <= 3, "peak {}", summary.peak_concurrency);
        assert_eq!(summary.records_written, 80);
    }

    #[tokio::test]
    async fn test_output_dir_created_only_with_downloads() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("Downloads");

        crawler(config(&temp_dir, 0, 1, 1), Arc::new(ScriptedSource::new()))
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert!(!output_dir.exists());

        let with_downloads = config(&temp_dir, 0, 1, 1).with_downloads(&output_dir);
        crawler(with_downloads, Arc::new(ScriptedSource::new()))
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert!(output_dir.is_dir());
    }

    #[tokio::test]
    async fn test_unopenable_log_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = CrawlConfig::new(0, 5, 2)
            .unwrap()
            .with_log_file(temp_dir.path().join("missing").join("songs.csv"));

        let result = crawler(config, Arc::new(ScriptedSource::new()))
            .run(CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CrawlError::Sink(SinkError::Open { .. }))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_log_write_failure_aborts_crawl() {
        let dev_full = Path::new("/dev/full");
        if !dev_full.exists() {
            return;
        }
        let mut source = ScriptedSource::new();
        for page in 0..200 {
            source = source.with_song_count(page, 20);
        }
        let config = CrawlConfig::new(0, 200, 2)
            .unwrap()
            .with_log_file(dev_full);

        let result = crawler(config, Arc::new(source))
            .run(CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CrawlError::Sink(_))), "got: {result:?}");
    }
}
