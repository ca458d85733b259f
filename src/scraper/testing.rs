//! In-memory [Fetch] implementation serving fixed pages and files, for tests and offline fixtures.

use crate::scraper::client::{write_stream, Fetch};
use crate::scraper::error::ScraperError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// A fake catalog site. Unknown URLs answer with HTTP 404.
///
/// Every request is recorded (relative to the base when it lies under it) so tests can assert
/// exactly which pages were fetched.
#[derive(Debug, Default)]
pub struct StubSite {
    base: String,
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubSite {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    fn key(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            path.to_string()
        }
    }

    /// Serve `html` at `path` (site-relative, or absolute).
    pub fn page(mut self, path: &str, html: &str) -> Self {
        let key = self.key(path);
        self.pages.insert(key, html.to_string());
        self
    }

    /// Serve `body` as a downloadable file at `path`.
    pub fn file(mut self, path: &str, body: &[u8]) -> Self {
        let key = self.key(path);
        self.files.insert(key, body.to_vec());
        self
    }

    /// Requests made so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn record(&self, url: &str) {
        let shown = url.strip_prefix(self.base.as_str()).unwrap_or(url);
        self.requests.borrow_mut().push(shown.to_string());
    }

    fn not_found(url: &str) -> ScraperError {
        ScraperError::HttpStatus {
            status: 404,
            url: url.to_string(),
        }
    }
}

impl Fetch for StubSite {
    fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        self.record(url);
        self.pages.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    fn download(&self, url: &str, path: &Path) -> Result<u64, ScraperError> {
        self.record(url);
        let body = self.files.get(url).ok_or_else(|| Self::not_found(url))?;
        write_stream(Cursor::new(body.as_slice()), path)
    }
}
