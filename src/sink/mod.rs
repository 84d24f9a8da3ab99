//! Durable, single-writer log of every discovered song.
//!
//! Page tasks push [`Song`] values into a bounded channel; one blocking writer
//! task appends each as a CSV record `artistName,songName,MP3FilePath` to the
//! log file. The file is opened once in append mode and flushed when the
//! channel closes and the backlog has been written.
//!
//! Any write failure ends the writer with a [`SinkError`]. The crawl treats that
//! as fatal: the log is the authoritative record of what was discovered.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, trace};

use crate::catalog::Song;

/// Default capacity of the queue between page tasks and the writer.
pub const DEFAULT_SINK_CAPACITY: usize = 100;

/// Default log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "songs.csv";

/// Sending half handed to page tasks.
pub type SongSender = mpsc::Sender<Song>;

/// Errors from the song log writer.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The log file could not be opened for appending.
    #[error("failed to open song log {path}: {source}")]
    Open {
        /// Log file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or written.
    #[error("failed to write song log {path}: {source}")]
    Write {
        /// Log file path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Buffered records could not be flushed at the end of the drain.
    #[error("failed to flush song log {path}: {source}")]
    Flush {
        /// Log file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A log file could not be read back.
    #[error("failed to read song log {path}: {source}")]
    Read {
        /// Log file path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The writer task panicked or was cancelled.
    #[error("song log writer task failed: {0}")]
    Join(#[from] JoinError),
}

/// Handle to the running log writer.
///
/// Awaiting the sink yields the number of records written once every
/// [`SongSender`] has been dropped and the backlog is on disk.
#[derive(Debug)]
pub struct ItemSink {
    path: PathBuf,
    handle: JoinHandle<Result<u64, SinkError>>,
}

impl ItemSink {
    /// Opens `path` for appending (creating it if absent) and starts the writer.
    ///
    /// Returns the sender page tasks clone, and the sink handle.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be opened.
    pub async fn spawn(path: &Path, capacity: usize) -> Result<(SongSender, Self), SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .into_std()
            .await;

        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let writer_path = path.to_path_buf();
        let handle =
            tokio::task::spawn_blocking(move || write_records(file, receiver, &writer_path));

        debug!(path = %path.display(), capacity, "song log writer started");
        Ok((
            sender,
            Self {
                path: path.to_path_buf(),
                handle,
            },
        ))
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Future for ItemSink {
    type Output = Result<u64, SinkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(SinkError::Join(e))))
    }
}

fn write_records(
    file: std::fs::File,
    mut receiver: mpsc::Receiver<Song>,
    path: &Path,
) -> Result<u64, SinkError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    let mut written = 0u64;

    while let Some(song) = receiver.blocking_recv() {
        writer
            .write_record([
                song.artist_name.as_str(),
                song.song_name.as_str(),
                song.mp3_file_path.as_str(),
            ])
            .map_err(|source| SinkError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        written += 1;
        trace!(artist = %song.artist_name, song = %song.song_name, "song logged");
    }

    writer.flush().map_err(|source| SinkError::Flush {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), records = written, "song log closed");
    Ok(written)
}

/// Reads every record of a song log back, in file order.
///
/// # Errors
///
/// Returns [`SinkError::Read`] if the file is missing or a record is not a
/// three-field CSV row.
pub fn read_log(path: &Path) -> Result<Vec<Song>, SinkError> {
    let read_error = |source| SinkError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(read_error)?;

    reader
        .deserialize::<(String, String, String)>()
        .map(|record| {
            record
                .map(|(artist, song, url)| Song::new(artist, song, url))
                .map_err(read_error)
        })
        .collect()
}
