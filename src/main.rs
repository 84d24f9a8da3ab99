//! CLI entry point for the catalog crawler.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crawler_core::crawl::to_mib;
use crawler_core::{CatalogClient, Crawler, HttpClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.log_level());
    debug!(?args, "CLI arguments parsed");

    let config = args.to_config().context("invalid arguments")?;
    let source = CatalogClient::new(&args.base_url)
        .with_context(|| format!("cannot use listing endpoint {}", args.base_url))?;

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    let crawler = Crawler::new(config, Arc::new(source), HttpClient::new());
    let summary = crawler.run(cancel).await.context("crawl failed")?;

    info!(
        pages = summary.pages_dispatched,
        empty_pages = summary.empty_pages,
        failed_pages = summary.failed_pages,
        songs = summary.records_written,
        downloads = summary.downloads_completed,
        failed_downloads = summary.downloads_failed,
        mib = %format!("{:.2}", to_mib(summary.bytes_downloaded)),
        secs = %format!("{:.1}", summary.elapsed.as_secs_f64()),
        "done"
    );
    if summary.interrupted() {
        warn!("stopped early on interrupt");
    }
    Ok(())
}

/// Cancels `cancel` on the first Ctrl+C; later ones are swallowed.
fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, finishing dispatched pages");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl+C"),
        }
    });
}

fn init_tracing(default_level: &str) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
