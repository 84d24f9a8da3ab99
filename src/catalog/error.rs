//! Error types for listing page fetches.

use thiserror::Error;

/// Errors that can occur while fetching or decoding a listing page.
///
/// None of these count as an empty page: the crawler logs them and leaves the
/// consecutive-empty-page counter untouched.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured listing endpoint is not a valid absolute URL.
    #[error("invalid listing URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build listing HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level failure while requesting or reading the page.
    #[error("network error fetching page {page}: {source}")]
    Network {
        /// Page index.
        page: u32,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout fetching page {page}")]
    Timeout {
        /// Page index.
        page: u32,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching page {page}")]
    HttpStatus {
        /// Page index.
        page: u32,
        /// The HTTP status code.
        status: u16,
    },

    /// The body was not a `{ "songs": [...] }` document.
    #[error("failed to decode page {page}: {source}")]
    Decode {
        /// Page index.
        page: u32,
        /// The JSON decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates a network error, promoting reqwest timeouts to [`Self::Timeout`].
    pub fn network(page: u32, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { page }
        } else {
            Self::Network { page, source }
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(page: u32, status: u16) -> Self {
        Self::HttpStatus { page, status }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(page: u32, source: serde_json::Error) -> Self {
        Self::Decode { page, source }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
