//! Destination paths and the per-book download step.

use crate::model::{Book, FileFormat};
use crate::scraper::{Fetch, ScraperError};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_FILENAME_TEMPLATE: &str = "{author}. {title}";
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Where and how books are written.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub dest: PathBuf,
    /// Supports `{author}` and `{title}` placeholders.
    pub filename_template: String,
    pub format: FileFormat,
    /// Pause after every download.
    pub delay: Duration,
}

impl DownloadOptions {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            format: FileFormat::default(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

/// Result of handling one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded { path: PathBuf, bytes: u64 },
    /// The site lists no link for the requested format.
    Skipped,
}

/// Replace path separators and NUL so a name stays a single path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

pub fn fill_template(template: &str, author: &str, title: &str) -> String {
    template
        .replace("{author}", author)
        .replace("{title}", title)
}

/// Extension of the last path segment of `url`, dot included. Empty when there is none.
pub fn extension_from_url(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rfind('.') {
        Some(0) | None => String::new(),
        Some(i) => last[i..].to_string(),
    }
}

/// `{dest}/{author}/{template}{ext}` for `book` downloaded from `url`.
pub fn book_path(dest: &Path, template: &str, book: &Book, url: &str) -> PathBuf {
    let name = fill_template(template, &book.author, &book.title);
    let file_name = format!("{}{}", sanitize_component(&name), extension_from_url(url));
    dest.join(sanitize_component(&book.author)).join(file_name)
}

/// Create `dir` if missing; on unix it is created with mode 0755.
pub fn ensure_dir(dir: &Path) -> Result<(), ScraperError> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir).map_err(|source| ScraperError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Download one book in the configured format, then pause for `options.delay`.
///
/// A book without a link for the format is skipped with a warning and nothing is written.
pub fn download_book<F: Fetch + ?Sized>(
    fetcher: &F,
    book: &Book,
    options: &DownloadOptions,
) -> Result<Outcome, ScraperError> {
    let Some(url) = book.url_for(options.format) else {
        warn!(
            author = %book.author,
            title = %book.title,
            format = %options.format,
            "no download link for format, skipping"
        );
        return Ok(Outcome::Skipped);
    };
    let path = book_path(&options.dest, &options.filename_template, book, url);
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let bytes = fetcher.download(url, &path)?;
    debug!(path = %path.display(), bytes, "saved book");
    std::thread::sleep(options.delay);
    Ok(Outcome::Downloaded { path, bytes })
}
