//! fb2epub-dl: CLI scraper that downloads every book by an author from the fb2-epub.ru catalog.

pub mod cli;
pub mod config;
pub mod download;
pub mod model;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use download::{download_book, DownloadOptions, Outcome};
pub use model::{Book, FileFormat, SearchResult};
pub use crate::scraper::{
    BookIterator, Catalog, CatalogClient, CatalogClientBuilder, Fetch, ScraperError, Search,
};
