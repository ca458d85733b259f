//! Data model for scraped catalog entries.
//!
//! The extractor builds these from detail pages; the download loop and `--list` consume them.

use serde::{Deserialize, Serialize};

/// One book as described by its detail page. All URLs are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub author: String,
    #[serde(rename = "authorUrl")]
    pub author_url: String,
    pub title: String,
    /// Paragraphs of the detail page joined with `\n`. Empty when the page has none.
    pub description: String,
    #[serde(rename = "fb2Url", skip_serializing_if = "Option::is_none")]
    pub fb2_url: Option<String>,
    #[serde(rename = "epubUrl", skip_serializing_if = "Option::is_none")]
    pub epub_url: Option<String>,
}

impl Book {
    /// Download link for the requested format, if the site lists one.
    pub fn url_for(&self, format: FileFormat) -> Option<&str> {
        match format {
            FileFormat::Epub => self.epub_url.as_deref(),
            FileFormat::Fb2 => self.fb2_url.as_deref(),
        }
    }
}

/// One author entry matched by a search: the listing URL as found on the page and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

/// Download format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Epub,
    Fb2,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Epub => "epub",
            FileFormat::Fb2 => "fb2",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
