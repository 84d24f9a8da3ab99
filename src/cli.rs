//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use crawler_core::{
    ConfigError, CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_LISTING_URL, DEFAULT_LOG_FILE,
    DEFAULT_MAX_PAGE, DEFAULT_MIN_PAGE, DEFAULT_OUTPUT_DIR,
};

/// Crawl the artlist.io song listing.
///
/// Every song found is appended to a CSV log; with --download the MP3s are
/// saved as well. Ctrl+C stops dispatching new pages and lets running work
/// finish.
#[derive(Parser, Debug)]
#[command(name = "artlist-crawler")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// First page to crawl
    #[arg(long, default_value_t = DEFAULT_MIN_PAGE)]
    pub min: u32,

    /// Page to stop before (exclusive)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGE)]
    pub max: u32,

    /// Maximum concurrent page fetches and downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub conns: u8,

    /// Download the MP3 of every song found
    #[arg(short, long)]
    pub download: bool,

    /// Directory downloaded songs are saved into
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// CSV file songs are appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Song listing endpoint
    #[arg(long, default_value = DEFAULT_LISTING_URL)]
    pub base_url: String,
}

impl Args {
    /// Builds the validated run configuration.
    pub fn to_config(&self) -> Result<CrawlConfig, ConfigError> {
        let config = CrawlConfig::new(self.min, self.max, usize::from(self.conns))?
            .with_log_file(&self.log_file);
        Ok(if self.download {
            config.with_downloads(&self.output_dir)
        } else {
            config
        })
    }

    /// Default log filter from -q / -v.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
