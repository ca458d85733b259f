//! Paginated walk over an author's listing pages, yielding one [Book] per listed entry.

use crate::model::Book;
use crate::scraper::catalog::Catalog;
use crate::scraper::client::Fetch;
use crate::scraper::error::ScraperError;
use crate::scraper::query::{child_element, element_text, Page};
use scraper::ElementRef;
use std::collections::VecDeque;
use tracing::debug;

const SUMMARY: &str = ".numShown73";
const ENTRY_LINKS: &str = "#allEntries .My a";

/// Number of listing pages to walk for `total_count` entries shown `shown_per_page` at a time.
///
/// Zero entries means zero pages. Otherwise this is one more than the exact page count, and the
/// walk visits `{base}-1` up to `{base}-{pages - 1}`, matching how the site has always been read.
/// `None` when the count does not fit in a `u32`.
pub fn page_count(total_count: u32, shown_per_page: u32) -> Option<u32> {
    if total_count == 0 || shown_per_page == 0 {
        return Some(0);
    }
    total_count.div_ceil(shown_per_page).checked_add(1)
}

/// Read `(shown_per_page, total_count)` from a listing page.
///
/// The single summary element's text ends in `-{shown}` (e.g. `1-20`), and the first `<b>` child of
/// its grandparent holds the total.
pub fn parse_summary(page: &Page) -> Result<(u32, u32), ScraperError> {
    let url = page.url();
    let summary = page
        .select_one(SUMMARY)?
        .ok_or_else(|| ScraperError::parse(url, format!("missing {}", SUMMARY)))?;

    let text = element_text(summary);
    let shown_per_page = text
        .rsplit('-')
        .next()
        .map(str::trim)
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| ScraperError::parse(url, format!("bad page size in {:?}", text)))?;

    let total = summary
        .parent()
        .and_then(|p| p.parent())
        .and_then(ElementRef::wrap)
        .and_then(|gp| child_element(gp, "b"))
        .ok_or_else(|| ScraperError::parse(url, "missing total count next to the summary"))?;
    let total_text = element_text(total);
    let total_count = total_text
        .parse::<u32>()
        .map_err(|e| ScraperError::parse(url, format!("bad total count {:?}: {}", total_text, e)))?;

    Ok((shown_per_page, total_count))
}

/// Lazy, forward-only sequence of every book under one author listing.
///
/// Construction fetches the base page once to read the counts. Iteration then fetches each
/// `{base}-{n}` page and every detail page it links, one at a time. The first error is yielded and
/// ends the sequence; it cannot be restarted.
pub struct BookIterator<'a, F: Fetch + ?Sized> {
    catalog: Catalog<'a, F>,
    base_url: String,
    shown_per_page: u32,
    total_count: u32,
    next_page: u32,
    page_count: u32,
    pending: VecDeque<String>,
    done: bool,
}

impl<'a, F: Fetch + ?Sized> BookIterator<'a, F> {
    pub fn new(catalog: Catalog<'a, F>, base_url: &str) -> Result<Self, ScraperError> {
        let first = catalog.page(base_url)?;
        let (shown_per_page, total_count) = parse_summary(&first)?;
        let pages = page_count(total_count, shown_per_page).ok_or_else(|| {
            ScraperError::parse(
                first.url(),
                format!(
                    "page count overflows for {} entries shown {} per page",
                    total_count, shown_per_page
                ),
            )
        })?;
        debug!(
            url = base_url,
            shown_per_page, total_count, pages, "read listing summary"
        );
        Ok(Self {
            catalog,
            base_url: base_url.to_string(),
            shown_per_page,
            total_count,
            next_page: 1,
            page_count: pages,
            pending: VecDeque::new(),
            done: false,
        })
    }

    pub fn shown_per_page(&self) -> u32 {
        self.shown_per_page
    }

    /// Total entries the listing reports.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    fn load_page(&self, page: u32) -> Result<Vec<String>, ScraperError> {
        let href = format!("{}-{}", self.base_url, page);
        let listing = self.catalog.page(&href)?;
        let links: Vec<String> = listing
            .select_all(ENTRY_LINKS)?
            .into_iter()
            .filter_map(|a| a.value().attr("href").map(String::from))
            .collect();
        debug!(page, entries = links.len(), "listing page loaded");
        Ok(links)
    }
}

impl<F: Fetch + ?Sized> Iterator for BookIterator<'_, F> {
    type Item = Result<Book, ScraperError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(href) = self.pending.pop_front() {
                let book = self.catalog.get_book(&href);
                if book.is_err() {
                    self.done = true;
                }
                return Some(book);
            }
            if self.next_page >= self.page_count {
                self.done = true;
                return None;
            }
            let page = self.next_page;
            self.next_page += 1;
            match self.load_page(page) {
                Ok(links) => self.pending.extend(links),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<F: Fetch + ?Sized> std::iter::FusedIterator for BookIterator<'_, F> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::StubSite;

    const BASE: &str = "http://catalog.test";

    fn listing(shown: &str, total: &str, links: &[&str]) -> String {
        let entries: String = links
            .iter()
            .map(|l| format!(r#"<div class="My"><a href="{}">book</a></div>"#, l))
            .collect();
        format!(
            r#"<html><body>
<div class="pager"><b>{total}</b><div><span class="numShown73">{shown}</span></div></div>
<div id="allEntries">{entries}</div>
</body></html>"#
        )
    }

    fn detail(title: &str) -> String {
        format!(
            r#"<div class="eText"><h1><a href="/load/author/1">Автор</a> {title}.</h1>
<div><a href="/files/{title}.epub">epub</a></div></div>"#
        )
    }

    #[test]
    fn page_count_adds_one_past_exact_count() {
        assert_eq!(page_count(0, 20), Some(0));
        assert_eq!(page_count(1, 20), Some(2));
        assert_eq!(page_count(20, 20), Some(2));
        assert_eq!(page_count(45, 20), Some(4));
    }

    #[test]
    fn page_count_overflow_is_none() {
        assert_eq!(page_count(u32::MAX, 1), None);
        assert_eq!(page_count(u32::MAX, 2), Some(u32::MAX / 2 + 2));
    }

    #[test]
    fn oversized_total_is_a_parse_error() -> Result<(), ScraperError> {
        let total = u32::MAX.to_string();
        let site = StubSite::new(BASE).page("/load/a", &listing("1-1", &total, &[]));
        let catalog = Catalog::new(&site, BASE)?;
        match catalog.iter_books("/load/a") {
            Err(ScraperError::ParsePage { message, .. }) => {
                assert!(message.contains("overflows"))
            }
            Err(e) => panic!("expected ParsePage, got {:?}", e),
            Ok(_) => panic!("expected ParsePage, got an iterator"),
        }
        assert_eq!(site.requests(), ["/load/a"]);
        Ok(())
    }

    #[test]
    fn parse_summary_reads_page_size_and_total() -> Result<(), ScraperError> {
        let page = Page::parse("http://catalog.test/a", &listing("1-20", "45", &[]));
        assert_eq!(parse_summary(&page)?, (20, 45));
        Ok(())
    }

    #[test]
    fn parse_summary_missing_element_errors() {
        let page = Page::parse("http://catalog.test/a", "<html><body></body></html>");
        assert!(matches!(
            parse_summary(&page),
            Err(ScraperError::ParsePage { .. })
        ));
    }

    #[test]
    fn parse_summary_ambiguous_element_errors() {
        let html = r#"<div><b>3</b><div><span class="numShown73">1-20</span><span class="numShown73">1-20</span></div></div>"#;
        let page = Page::parse("http://catalog.test/a", html);
        assert!(matches!(
            parse_summary(&page),
            Err(ScraperError::AmbiguousSelection { .. })
        ));
    }

    #[test]
    fn parse_summary_rejects_zero_page_size() {
        let page = Page::parse("http://catalog.test/a", &listing("1-0", "3", &[]));
        assert!(parse_summary(&page).is_err());
    }

    #[test]
    fn zero_total_fetches_only_the_base_page() -> Result<(), ScraperError> {
        let site = StubSite::new(BASE).page("/load/a", &listing("1-20", "0", &[]));
        let catalog = Catalog::new(&site, BASE)?;
        let books = catalog.iter_books("/load/a")?;
        assert_eq!(books.total_count(), 0);
        assert_eq!(books.count(), 0);
        assert_eq!(site.requests(), ["/load/a"]);
        Ok(())
    }

    #[test]
    fn walks_suffixed_pages_for_45_of_20() -> Result<(), ScraperError> {
        let site = StubSite::new(BASE)
            .page("/load/a", &listing("1-20", "45", &[]))
            .page("/load/a-1", &listing("1-20", "45", &["/load/b/1"]))
            .page("/load/a-2", &listing("21-40", "45", &["/load/b/2", "/load/b/3"]))
            .page("/load/a-3", &listing("41-45", "45", &[]))
            .page("/load/b/1", &detail("Один"))
            .page("/load/b/2", &detail("Два"))
            .page("/load/b/3", &detail("Три"));
        let catalog = Catalog::new(&site, BASE)?;
        let titles: Vec<String> = catalog
            .iter_books("/load/a")?
            .map(|b| b.map(|b| b.title))
            .collect::<Result<_, _>>()?;
        assert_eq!(titles, ["Один", "Два", "Три"]);
        assert_eq!(
            site.requests(),
            [
                "/load/a",
                "/load/a-1",
                "/load/b/1",
                "/load/a-2",
                "/load/b/2",
                "/load/b/3",
                "/load/a-3",
            ]
        );
        Ok(())
    }

    #[test]
    fn page_failure_ends_iteration() -> Result<(), ScraperError> {
        let site = StubSite::new(BASE).page("/load/a", &listing("1-20", "5", &[]));
        let catalog = Catalog::new(&site, BASE)?;
        let mut books = catalog.iter_books("/load/a")?;
        assert!(matches!(
            books.next(),
            Some(Err(ScraperError::HttpStatus { status: 404, .. }))
        ));
        assert!(books.next().is_none());
        assert_eq!(site.requests(), ["/load/a", "/load/a-1"]);
        Ok(())
    }
}
