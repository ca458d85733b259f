//! Shared error type for the catalog scraper.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from fetching, parsing, and downloading catalog pages.
#[derive(Debug, Error)]
pub enum ScraperError {
    // URLs and selectors
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Invalid CSS selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Page structure
    /// A selector expected to match at most once matched several elements.
    /// `found` holds the outer HTML of every match, in document order.
    #[error("Selector {selector:?} matched {} elements, expected at most one", .found.len())]
    AmbiguousSelection {
        selector: String,
        found: Vec<String>,
    },

    #[error("Could not parse page {url}: {message}")]
    ParsePage { url: String, message: String },

    #[error("No authors matching {query:?} were found in the catalog.")]
    NoSearchResults { query: String },

    // Filesystem
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScraperError {
    pub(crate) fn parse(url: &str, message: impl Into<String>) -> Self {
        ScraperError::ParsePage {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
