//! Book detail page extraction.

use crate::model::Book;
use crate::scraper::catalog::absolute_url;
use crate::scraper::error::ScraperError;
use crate::scraper::query::{child_element, leading_text, select_all, select_one, Page};
use reqwest::Url;
use scraper::ElementRef;

const MAIN_TEXT: &str = ".eText";
const FB2_LINK: &str = r#"div a[href$=".zip"]"#;
const EPUB_LINK: &str = r#"div a[href$=".epub"]"#;

/// Strip whitespace and dots from both ends of a raw title text node.
pub fn clean_title(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

/// Leading text of every paragraph that has any, trimmed and joined with `\n` in document order.
///
/// A paragraph opening with an element is skipped; a whitespace-only one becomes an empty line.
fn description(container: ElementRef<'_>) -> Result<String, ScraperError> {
    let paragraphs: Vec<String> = select_all(container, "p")?
        .into_iter()
        .filter_map(leading_text)
        .filter(|t| !t.is_empty())
        .map(|t| t.trim().to_string())
        .collect();
    Ok(paragraphs.join("\n"))
}

fn optional_link(
    container: ElementRef<'_>,
    sel: &str,
    base: &Url,
) -> Result<Option<String>, ScraperError> {
    select_one(container, sel)?
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolute_url(base, href))
        .transpose()
}

/// Extract a [Book] from a parsed detail page. Relative links are resolved against `base`.
///
/// The page must have exactly one `.eText` container. Its first direct `h1` child holds, as a
/// direct child, the author link followed by the title text.
pub fn parse_book(page: &Page, base: &Url) -> Result<Book, ScraperError> {
    let url = page.url();
    let container = page
        .select_one(MAIN_TEXT)?
        .ok_or_else(|| ScraperError::parse(url, format!("missing {}", MAIN_TEXT)))?;

    let heading = child_element(container, "h1")
        .ok_or_else(|| ScraperError::parse(url, "missing book heading"))?;
    let author_link = child_element(heading, "a")
        .ok_or_else(|| ScraperError::parse(url, "missing author link"))?;
    let author_href = author_link
        .value()
        .attr("href")
        .ok_or_else(|| ScraperError::parse(url, "author link has no href"))?;

    let title = author_link
        .next_sibling()
        .and_then(|node| node.value().as_text().map(|t| clean_title(t)))
        .ok_or_else(|| ScraperError::parse(url, "missing title after author link"))?;

    Ok(Book {
        author: leading_text(author_link)
            .map(|t| t.trim().to_string())
            .unwrap_or_default(),
        author_url: absolute_url(base, author_href)?,
        title,
        description: description(container)?,
        fb2_url: optional_link(container, FB2_LINK, base)?,
        epub_url: optional_link(container, EPUB_LINK, base)?,
    })
}
