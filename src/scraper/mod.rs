//! Catalog scraping: HTTP client seam, HTML query helpers, index and search, listing pagination,
//! and detail page extraction.

mod books;
mod catalog;
mod client;
mod detail;
mod error;
pub mod query;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use books::{page_count, parse_summary, BookIterator};
pub use catalog::{absolute_url, Catalog, IndexMapping, Search, DEFAULT_BASE_URL};
pub use client::{write_stream, CatalogClient, CatalogClientBuilder, Fetch, CHUNK_SIZE};
pub use detail::{clean_title, parse_book};
pub use error::ScraperError;
