//! Blocking HTTP client for the catalog site and the `Fetch` seam the scraper is written against.

use crate::scraper::error::ScraperError;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; fb2epub-dl/0.1)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Size of the buffer used to stream download bodies to disk.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Source of pages and files. `url` is always absolute.
///
/// The scraper only talks to the network through this trait, so a stub can stand in for the site.
pub trait Fetch {
    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> Result<String, ScraperError>;

    /// GET `url` and stream the body into a newly created file at `path`.
    /// Returns the number of bytes written. A failure mid-stream leaves the partial file.
    fn download(&self, url: &str, path: &Path) -> Result<u64, ScraperError>;
}

/// Copy `reader` into a new file at `path` in `CHUNK_SIZE` pieces.
pub fn write_stream<R: Read>(mut reader: R, path: &Path) -> Result<u64, ScraperError> {
    let io_err = |source| ScraperError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut out = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_err(e)),
        };
        out.write_all(&buf[..n]).map_err(io_err)?;
        written += n as u64;
    }
    out.flush().map_err(io_err)?;
    Ok(written)
}

/// Blocking HTTP client used against the live catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    inner: reqwest::blocking::Client,
}

impl CatalogClient {
    /// Build a client with the default User-Agent and timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::default()
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, ScraperError> {
        debug!(url, "GET");
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|source| ScraperError::Network {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

impl Fetch for CatalogClient {
    fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        self.send(url)?
            .text()
            .map_err(|source| ScraperError::BodyRead {
                url: url.to_string(),
                source,
            })
    }

    fn download(&self, url: &str, path: &Path) -> Result<u64, ScraperError> {
        let response = self.send(url)?;
        let written = write_stream(response, path)?;
        debug!(url, path = %path.display(), bytes = written, "downloaded");
        Ok(written)
    }
}

/// Builder for [CatalogClient] with optional User-Agent and timeout.
#[derive(Debug)]
pub struct CatalogClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
}

impl Default for CatalogClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CatalogClientBuilder {
    /// Set a custom User-Agent. If not set, a generic default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<CatalogClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(CatalogClient { inner })
    }
}
