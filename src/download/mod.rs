//! HTTP payload download for discovered songs.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Exclusive file creation: an existing file is never overwritten
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use crawler_core::catalog::Song;
//! use crawler_core::download::{HttpClient, song_file_path};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let song = Song::new("Artist", "Song", "https://cdn.example.com/song.mp3");
//! let client = HttpClient::new();
//! let path = song_file_path(Path::new("./Downloads"), &song);
//! let bytes = client.download_to_new_file(&song.mp3_file_path, &path).await?;
//! println!("Downloaded {bytes} bytes to {}", path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;

pub use client::HttpClient;
pub(crate) use client::build_client;
pub use error::DownloadError;
pub use filename::{SONG_EXTENSION, song_file_name, song_file_path};
