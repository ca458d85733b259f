//! Catalog entry points: URL resolution, the alphabetical index, and author search.

use crate::model::{Book, SearchResult};
use crate::scraper::books::BookIterator;
use crate::scraper::client::Fetch;
use crate::scraper::detail::parse_book;
use crate::scraper::error::ScraperError;
use crate::scraper::query::{element_text, leading_text, Page};
use reqwest::Url;
use std::collections::BTreeMap;
use tracing::debug;

/// Origin of the live catalog site.
pub const DEFAULT_BASE_URL: &str = "https://fb2-epub.ru";

const INDEX_LINKS: &str = "#s1 a";
const AUTHOR_LINKS: &str = "h2 + p a";

/// Lowercased index letter -> listing page href, as found on the catalog root page.
pub type IndexMapping = BTreeMap<String, String>;

/// Resolve `href` against `base`. Absolute hrefs are returned unchanged.
pub fn absolute_url(base: &Url, href: &str) -> Result<String, ScraperError> {
    base.join(href)
        .map(String::from)
        .map_err(|e| ScraperError::InvalidUrl {
            input: href.to_string(),
            reason: e.to_string(),
        })
}

/// The catalog site seen through a [Fetch] implementation.
pub struct Catalog<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    base: Url,
}

impl<F: Fetch + ?Sized> Clone for Catalog<'_, F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher,
            base: self.base.clone(),
        }
    }
}

impl<'a, F: Fetch + ?Sized> Catalog<'a, F> {
    pub fn new(fetcher: &'a F, base_url: &str) -> Result<Self, ScraperError> {
        let base = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
            input: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { fetcher, base })
    }

    pub fn fetcher(&self) -> &'a F {
        self.fetcher
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn abs_url(&self, href: &str) -> Result<String, ScraperError> {
        absolute_url(&self.base, href)
    }

    /// Fetch and parse a catalog page. `href` may be site-relative.
    pub fn page(&self, href: &str) -> Result<Page, ScraperError> {
        let url = self.abs_url(href)?;
        let body = self.fetcher.get_text(&url)?;
        Ok(Page::parse(url, &body))
    }

    /// Fetch the root page and map each index letter to its listing page. Not cached.
    pub fn get_index(&self) -> Result<IndexMapping, ScraperError> {
        let page = self.page("/")?;
        let mut index = IndexMapping::new();
        for a in page.select_all(INDEX_LINKS)? {
            let Some(href) = a.value().attr("href") else {
                continue;
            };
            let letter = leading_text(a).unwrap_or_default().trim().to_lowercase();
            index.insert(letter, href.to_string());
        }
        debug!(letters = index.len(), "loaded catalog index");
        Ok(index)
    }

    /// Lazily search the index page for authors whose name contains `query`. See [Search].
    pub fn search(&self, query: &str) -> Search<'a, F> {
        Search {
            catalog: self.clone(),
            query: query.to_string(),
            state: SearchState::Pending,
        }
    }

    /// Fetch a detail page and extract its [Book].
    pub fn get_book(&self, href: &str) -> Result<Book, ScraperError> {
        let page = self.page(href)?;
        parse_book(&page, &self.base)
    }

    /// Walk every book listed under `href` across all of its pages. Fetches the base page immediately.
    pub fn iter_books(&self, href: &str) -> Result<BookIterator<'a, F>, ScraperError> {
        BookIterator::new(self.clone(), href)
    }
}

enum SearchState {
    Pending,
    Ready(std::vec::IntoIter<SearchResult>),
    Done,
}

/// Author search results, in document order.
///
/// Nothing is fetched until the first call to `next`, which loads the index and the letter page.
/// The sequence is single-pass: once exhausted it stays exhausted, and running the search
/// again means calling [Catalog::search] again (which fetches again). A fetch or parse error is
/// yielded once and ends the sequence.
///
/// Matching is a case-sensitive substring test of `query` against the anchor text;
/// only the index letter lookup is lowercased.
pub struct Search<'a, F: Fetch + ?Sized> {
    catalog: Catalog<'a, F>,
    query: String,
    state: SearchState,
}

impl<F: Fetch + ?Sized> Search<'_, F> {
    fn load(&self) -> Result<Vec<SearchResult>, ScraperError> {
        let Some(first) = self.query.chars().next() else {
            return Ok(Vec::new());
        };
        let letter: String = first.to_lowercase().collect();
        let index = self.catalog.get_index()?;
        let Some(href) = index.get(&letter) else {
            debug!(letter = %letter, "no index page for letter");
            return Ok(Vec::new());
        };
        let page = self.catalog.page(href)?;
        let mut results = Vec::new();
        for a in page.select_all(AUTHOR_LINKS)? {
            // match on the whole anchor text, display only its leading text
            if !element_text(a).contains(self.query.as_str()) {
                continue;
            }
            if let Some(url) = a.value().attr("href") {
                let title = leading_text(a).unwrap_or_default().trim().to_string();
                results.push(SearchResult {
                    url: url.to_string(),
                    title,
                });
            }
        }
        debug!(query = %self.query, matches = results.len(), "search finished");
        Ok(results)
    }
}

impl<F: Fetch + ?Sized> Iterator for Search<'_, F> {
    type Item = Result<SearchResult, ScraperError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, SearchState::Pending) {
            match self.load() {
                Ok(results) => self.state = SearchState::Ready(results.into_iter()),
                Err(e) => {
                    self.state = SearchState::Done;
                    return Some(Err(e));
                }
            }
        }
        match &mut self.state {
            SearchState::Ready(results) => match results.next() {
                Some(result) => Some(Ok(result)),
                None => {
                    self.state = SearchState::Done;
                    None
                }
            },
            SearchState::Pending | SearchState::Done => None,
        }
    }
}

impl<F: Fetch + ?Sized> std::iter::FusedIterator for Search<'_, F> {}
