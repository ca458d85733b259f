//! Typed query layer over `scraper`: parsed pages plus the "all matches" and "at most one match" helpers
//! every extractor uses to assert page structure.

use crate::scraper::error::ScraperError;
use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
pub fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Every descendant of `scope` matching `sel`, in document order. Empty when nothing matches.
pub fn select_all<'a>(scope: ElementRef<'a>, sel: &str) -> Result<Vec<ElementRef<'a>>, ScraperError> {
    let selector = parse_selector(sel)?;
    Ok(scope.select(&selector).collect())
}

/// The single descendant of `scope` matching `sel`, or `None` when there is none.
///
/// More than one match fails with [ScraperError::AmbiguousSelection] carrying the outer HTML of every match.
pub fn select_one<'a>(
    scope: ElementRef<'a>,
    sel: &str,
) -> Result<Option<ElementRef<'a>>, ScraperError> {
    let mut found = select_all(scope, sel)?;
    if found.len() > 1 {
        return Err(ScraperError::AmbiguousSelection {
            selector: sel.to_string(),
            found: found.iter().map(|e| e.html()).collect(),
        });
    }
    Ok(found.pop())
}

/// All text inside `el`, trimmed.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text before the first child element of `el`, untrimmed. `None` when `el` starts with an
/// element or has no children.
pub fn leading_text(el: ElementRef<'_>) -> Option<String> {
    el.first_child()
        .and_then(|node| node.value().as_text().map(|t| String::from(&**t)))
}

/// First direct child element of `el` with tag `name`.
pub fn child_element<'a>(el: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == name)
}

/// A fetched and parsed HTML page, remembering the URL it came from for error messages.
pub struct Page {
    url: String,
    html: Html,
}

impl Page {
    pub fn parse(url: impl Into<String>, body: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(body),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn select_all(&self, sel: &str) -> Result<Vec<ElementRef<'_>>, ScraperError> {
        select_all(self.root(), sel)
    }

    pub fn select_one(&self, sel: &str) -> Result<Option<ElementRef<'_>>, ScraperError> {
        select_one(self.root(), sel)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
<div class="one">first</div>
<div class="two">a</div>
<div class="two">b</div>
<section><div class="two">c</div></section>
</body></html>"#;

    #[test]
    fn select_all_keeps_document_order() -> Result<(), ScraperError> {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        let texts: Vec<String> = page
            .select_all(".two")?
            .into_iter()
            .map(element_text)
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert!(page.select_all(".missing")?.is_empty());
        Ok(())
    }

    #[test]
    fn select_one_single_match() -> Result<(), ScraperError> {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        let el = page.select_one(".one")?;
        assert_eq!(el.map(element_text).as_deref(), Some("first"));
        Ok(())
    }

    #[test]
    fn select_one_no_match_is_none() -> Result<(), ScraperError> {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        assert!(page.select_one(".missing")?.is_none());
        Ok(())
    }

    #[test]
    fn select_one_several_matches_carries_all_of_them() {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        match page.select_one(".two") {
            Err(ScraperError::AmbiguousSelection { selector, found }) => {
                assert_eq!(selector, ".two");
                assert_eq!(found.len(), 3);
                assert!(found[0].contains(">a<"));
                assert!(found[2].contains(">c<"));
            }
            other => panic!("expected AmbiguousSelection, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn select_one_scoped_to_element() -> Result<(), ScraperError> {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        let section = page.select_one("section")?.map(|s| select_one(s, ".two"));
        let inner = section.transpose()?.flatten();
        assert_eq!(inner.map(element_text).as_deref(), Some("c"));
        Ok(())
    }

    #[test]
    fn leading_text_stops_at_first_child_element() -> Result<(), ScraperError> {
        let page = Page::parse(
            "https://fb2-epub.ru/",
            "<p>plain</p><p>  </p><p><b>Bold</b> tail</p><p>head <i>x</i></p><p></p>",
        );
        let texts: Vec<Option<String>> = page
            .select_all("p")?
            .into_iter()
            .map(leading_text)
            .collect();
        assert_eq!(
            texts,
            [
                Some("plain".to_string()),
                Some("  ".to_string()),
                None,
                Some("head ".to_string()),
                None,
            ]
        );
        Ok(())
    }

    #[test]
    fn child_element_ignores_deeper_matches() -> Result<(), ScraperError> {
        let page = Page::parse(
            "https://fb2-epub.ru/",
            r#"<div id="c"><div><h1>nested</h1></div><h1>direct</h1></div>"#,
        );
        let container = page.select_one("#c")?;
        let h1 = container.and_then(|c| child_element(c, "h1"));
        assert_eq!(h1.map(element_text).as_deref(), Some("direct"));
        Ok(())
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let page = Page::parse("https://fb2-epub.ru/", HTML);
        assert!(matches!(
            page.select_all("div[["),
            Err(ScraperError::InvalidSelector { .. })
        ));
    }
}
