//! Fetch one listing page and fan its songs out to the log and downloader.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::CrawlContext;
use super::gate::GatePermit;
use super::item_task;

/// Runs one page task while holding `permit`.
///
/// A failed page is logged and counted but leaves the empty streak alone; an
/// empty page extends it; a page with songs resets it. Songs are handed to
/// the log in listing order, and each gets its own download task when
/// downloads are enabled.
#[instrument(skip(ctx, permit))]
pub(crate) async fn fetch_page(ctx: Arc<CrawlContext>, page: u32, permit: GatePermit) {
    let _permit = permit;

    let listing = match ctx.source.fetch_page(page).await {
        Ok(listing) => listing,
        Err(e) => {
            ctx.stats.record_failed_page();
            warn!(page, error = %e, "failed to get page");
            return;
        }
    };

    if listing.is_empty() {
        let streak = ctx.stats.record_empty_page();
        debug!(page, consecutive_empty = streak, "page is empty");
        return;
    }

    let songs = listing.len();
    ctx.stats.record_songs_page(songs);

    for song in listing.songs {
        let download = ctx.downloads.is_some().then(|| song.clone());

        if ctx.songs.send(song).await.is_err() {
            warn!(page, "song log closed, dropping the rest of this page");
            return;
        }

        if let Some(song) = download {
            ctx.tracker
                .spawn(item_task::download_song(Arc::clone(&ctx), song));
        }
    }

    info!(page, songs, "got page");
}
