//! Song catalog listing: data model and page sources.
//!
//! The remote catalog is a paged JSON listing. Each page decodes into a
//! [`Page`] of [`Song`] values; an empty page means the listing is exhausted
//! at that index and is distinct from a fetch or decode failure.
//!
//! # Architecture
//!
//! - [`Song`] - One discovered catalog entry
//! - [`Page`] - The ordered songs of one listing page
//! - [`PageSource`] - Async trait the crawler fetches pages through
//! - [`CatalogClient`] - HTTP implementation against the listing endpoint

mod client;
mod error;

pub use client::{CatalogClient, DEFAULT_LISTING_URL};
pub use error::CatalogError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One song discovered in the catalog listing.
///
/// Songs carry no identity beyond their fields; the same song appearing on two
/// pages is recorded twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Performing artist.
    #[serde(rename = "artistName")]
    pub artist_name: String,
    /// Song title.
    #[serde(rename = "songName")]
    pub song_name: String,
    /// URL of the MP3 payload.
    #[serde(rename = "MP3FilePath")]
    pub mp3_file_path: String,
}

impl Song {
    /// Creates a song from its three fields.
    pub fn new(
        artist_name: impl Into<String>,
        song_name: impl Into<String>,
        mp3_file_path: impl Into<String>,
    ) -> Self {
        Self {
            artist_name: artist_name.into(),
            song_name: song_name.into(),
            mp3_file_path: mp3_file_path.into(),
        }
    }
}

/// The songs returned for one page index, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page index the songs were fetched for.
    pub index: u32,
    /// Songs in the order the listing returned them.
    pub songs: Vec<Song>,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub fn new(index: u32, songs: Vec<Song>) -> Self {
        Self { index, songs }
    }

    /// Returns true when the listing had no songs at this index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Number of songs on the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }
}

/// Source of listing pages.
///
/// The crawler only depends on this trait, so tests can feed scripted pages
/// without an HTTP server.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches and decodes one page; a single attempt, no retries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the page cannot be fetched or decoded.
    async fn fetch_page(&self, index: u32) -> Result<Page, CatalogError>;
}
