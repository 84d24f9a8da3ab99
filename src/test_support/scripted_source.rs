//! In-memory [`PageSource`] with per-page canned results.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::{CatalogError, Page, PageSource, Song};

#[derive(Debug, Clone)]
enum Scripted {
    Songs(Vec<Song>),
    Status(u16),
}

/// Pages not scripted explicitly come back empty.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pages: HashMap<u32, Scripted>,
    delay: Duration,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_songs(mut self, index: u32, songs: Vec<Song>) -> Self {
        self.pages.insert(index, Scripted::Songs(songs));
        self
    }

    /// Scripts `count` songs named after the page.
    pub fn with_song_count(self, index: u32, count: usize) -> Self {
        self.with_songs(index, songs_for_page(index, count))
    }

    pub fn with_failure(mut self, index: u32, status: u16) -> Self {
        self.pages.insert(index, Scripted::Status(status));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Page indices fetched so far, sorted.
    pub fn requested(&self) -> Vec<u32> {
        let mut requested = self.requested.lock().unwrap().clone();
        requested.sort_unstable();
        requested
    }
}

pub fn songs_for_page(index: u32, count: usize) -> Vec<Song> {
    (0..count)
        .map(|i| {
            Song::new(
                format!("Artist {index}"),
                format!("Song {index}-{i}"),
                format!("https://cdn.example.com/{index}/{i}.mp3"),
            )
        })
        .collect()
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, index: u32) -> Result<Page, CatalogError> {
        self.requested.lock().unwrap().push(index);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.pages.get(&index) {
            Some(Scripted::Songs(songs)) => Ok(Page::new(index, songs.clone())),
            Some(Scripted::Status(status)) => Err(CatalogError::http_status(index, *status)),
            None => Ok(Page::new(index, Vec::new())),
        }
    }
}
