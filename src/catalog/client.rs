//! HTTP client for the paged song listing endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogError, Page, PageSource, Song};
use crate::download::build_client;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Public song listing endpoint.
pub const DEFAULT_LISTING_URL: &str = "https://artlist.io/api/Song/List";

/// Sort order requested from the listing (newest first).
const SONG_SORT_ID: &str = "1";

/// Wire shape of one listing page.
#[derive(Debug, Deserialize)]
struct ListingResponse {
    songs: Vec<Song>,
}

/// Fetches listing pages over HTTP.
///
/// Every request carries the same fixed filter set (no search term, no
/// category, no vocal filter, unbounded duration); only `page` varies.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client for the listing endpoint at `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL, or [`CatalogError::ClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Self::new_with_timeouts(base_url, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::new`].
    pub fn new_with_timeouts(
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url).map_err(|_| CatalogError::invalid_url(base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CatalogError::invalid_url(base_url.as_str()));
        }
        let client = build_client(connect_timeout_secs, read_timeout_secs)
            .map_err(|source| CatalogError::ClientBuild { source })?;
        Ok(Self { client, base_url })
    }

    /// Builds the request URL for `index`.
    #[must_use]
    pub fn page_url(&self, index: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("searchTerm", "")
            .append_pair("categoryIDs", "")
            .append_pair("songSortID", SONG_SORT_ID)
            .append_pair("durationMin", "0")
            .append_pair("durationMax", "0")
            .append_pair("onlyVocal", "")
            .append_pair("page", &index.to_string());
        url
    }
}

#[async_trait]
impl PageSource for CatalogClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, index: u32) -> Result<Page, CatalogError> {
        let url = self.page_url(index);
        debug!(url = %url, "requesting listing page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::network(index, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(index, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::network(index, e))?;
        let listing: ListingResponse =
            serde_json::from_slice(&body).map_err(|e| CatalogError::decode(index, e))?;

        Ok(Page::new(index, listing.songs))
    }
}
