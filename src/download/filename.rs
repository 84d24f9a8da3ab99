//! Local file naming for downloaded songs.
//!
//! A song lands in `<output_dir>/<artist> - <song>.mp3`. The name is a pure
//! function of the song's metadata, so two songs with the same artist and title
//! collide; the second exclusive create then fails and that song is skipped.

use std::path::{Path, PathBuf};

use crate::catalog::Song;

/// Extension appended to every downloaded payload.
pub const SONG_EXTENSION: &str = "mp3";

/// Builds the file name for a song: `"<artist> - <song>.mp3"`.
///
/// Only characters that would escape the output directory or that no
/// filesystem accepts (path separators, control characters) are replaced.
#[must_use]
pub fn song_file_name(song: &Song) -> String {
    format!(
        "{} - {}.{SONG_EXTENSION}",
        sanitize_name_part(&song.artist_name),
        sanitize_name_part(&song.song_name)
    )
}

/// Joins [`song_file_name`] onto the output directory.
#[must_use]
pub fn song_file_path(output_dir: &Path, song: &Song) -> PathBuf {
    output_dir.join(song_file_name(song))
}

fn sanitize_name_part(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
