//! Validated run configuration for a crawl.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sink::{DEFAULT_LOG_FILE, DEFAULT_SINK_CAPACITY};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous page fetches and downloads.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default first page index.
pub const DEFAULT_MIN_PAGE: u32 = 0;

/// Default exclusive upper page index.
pub const DEFAULT_MAX_PAGE: u32 = 9999;

/// Default directory downloaded songs are written into.
pub const DEFAULT_OUTPUT_DIR: &str = "Downloads";

/// Errors raised while validating a [`CrawlConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Concurrency outside the supported range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },
}

/// Everything the crawler needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    min_page: u32,
    max_page: u32,
    concurrency: usize,
    download: bool,
    output_dir: PathBuf,
    log_file: PathBuf,
    sink_capacity: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            min_page: DEFAULT_MIN_PAGE,
            max_page: DEFAULT_MAX_PAGE,
            concurrency: DEFAULT_CONCURRENCY,
            download: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl CrawlConfig {
    /// Creates a configuration for pages `min_page..max_page` with `concurrency` slots.
    ///
    /// Downloads are off; the song log and output directory take their defaults.
    /// A range with `min_page >= max_page` is accepted and selects no pages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] if `concurrency` is outside
    /// 1-100.
    ///
    /// # Example
    ///
    /// ```
    /// use crawler_core::CrawlConfig;
    ///
    /// let config = CrawlConfig::new(0, 10, 4).unwrap();
    /// assert_eq!(config.page_count(), 10);
    /// assert_eq!(CrawlConfig::new(5, 5, 4).unwrap().page_count(), 0);
    /// assert!(CrawlConfig::new(0, 10, 0).is_err());
    /// ```
    pub fn new(min_page: u32, max_page: u32, concurrency: usize) -> Result<Self, ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            min_page,
            max_page,
            concurrency,
            ..Self::default()
        })
    }

    /// Enables song downloads into `output_dir`.
    #[must_use]
    pub fn with_downloads(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.download = true;
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the song log path.
    #[must_use]
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = log_file.into();
        self
    }

    /// Sets the capacity of the queue in front of the song log writer.
    #[must_use]
    pub fn with_sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn min_page(&self) -> u32 {
        self.min_page
    }

    #[must_use]
    pub fn max_page(&self) -> u32 {
        self.max_page
    }

    /// Number of page indices in the range.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.max_page.saturating_sub(self.min_page)
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Whether songs are downloaded as well as logged.
    #[must_use]
    pub fn download(&self) -> bool {
        self.download
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    #[must_use]
    pub fn sink_capacity(&self) -> usize {
        self.sink_capacity
    }
}
