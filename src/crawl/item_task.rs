//! Download one song into the output directory.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::CrawlContext;
use super::throughput::to_mib;
use crate::catalog::Song;
use crate::download::{song_file_name, song_file_path};

/// Downloads `song` once a gate slot is free.
///
/// The file is created exclusively, so a name collision or any later
/// failure is logged and the song is skipped. Partial files are left behind.
pub(crate) async fn download_song(ctx: Arc<CrawlContext>, song: Song) {
    let Some(target) = ctx.downloads.as_ref() else {
        return;
    };
    let file_name = song_file_name(&song);
    let file_path = song_file_path(&target.output_dir, &song);

    let _permit = match ctx.gate.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            ctx.stats.record_download_failed();
            warn!(file = %file_name, error = %e, "error downloading song");
            return;
        }
    };

    let started = Instant::now();
    match target
        .client
        .download_to_new_file(&song.mp3_file_path, &file_path)
        .await
    {
        Ok(bytes) => {
            let sample = ctx.throughput.record(bytes);
            ctx.stats.record_download_completed();
            info!(
                file = %file_name,
                avg_mib_per_sec = %format!("{:.2}", sample.average_mib_per_sec),
                mib = %format!("{:.2}", to_mib(bytes)),
                secs = %format!("{:.2}", started.elapsed().as_secs_f64()),
                "downloaded song"
            );
        }
        Err(e) => {
            ctx.stats.record_download_failed();
            warn!(file = %file_name, error = %e, "error downloading song");
        }
    }
}
