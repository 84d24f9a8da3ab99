//! Catalog crawler library
//!
//! Walks a paged song listing with bounded concurrency, records every song
//! it finds in a CSV log and can download each song's MP3 alongside.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Song model and the paged listing client
//! - [`config`] - Validated run configuration
//! - [`crawl`] - Coordinator, concurrency gate, page and download tasks
//! - [`download`] - Streaming HTTP downloads into exclusively created files
//! - [`sink`] - Single-writer CSV log of discovered songs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod crawl;
pub mod download;
pub mod sink;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogError, DEFAULT_LISTING_URL, Page, PageSource, Song};
pub use config::{
    ConfigError, CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGE, DEFAULT_MIN_PAGE,
    DEFAULT_OUTPUT_DIR, MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use crawl::{
    ConcurrencyGate, CrawlError, CrawlStats, CrawlSummary, Crawler, EMPTY_PAGE_THRESHOLD,
    StopReason,
};
pub use download::{DownloadError, HttpClient, song_file_name, song_file_path};
pub use sink::{DEFAULT_LOG_FILE, ItemSink, SinkError, read_log};
