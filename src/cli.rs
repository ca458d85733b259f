//! CLI parsing and orchestration. Parses args, searches the catalog, asks which author when several
//! match, then downloads every book. Maps errors to exit codes.

use crate::config::{self, Config};
use crate::download::{
    download_book, DownloadOptions, Outcome, DEFAULT_DELAY_MS, DEFAULT_FILENAME_TEMPLATE,
};
use crate::model::{FileFormat, SearchResult};
use crate::scraper::{Catalog, CatalogClient, Fetch, ScraperError, DEFAULT_BASE_URL};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("Failed to write listing: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(ScraperError::Io { .. }) => 3,
            CliRunError::Scraper(_) => 2,
            CliRunError::Output(_) | CliRunError::Io(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fb2epub-dl")]
#[command(about = "Download every book by an author from the fb2-epub.ru catalog")]
#[command(
    after_help = "Config file keys (base_url, user_agent, timeout_secs, download_delay_ms, filename_template, file_format) are read from ./fb2epub-dl.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Author name, or part of it, to search for. Matching is case-sensitive.
    pub query: String,

    /// Existing directory to download into. One subdirectory is created per author.
    pub dest: PathBuf,

    /// File name template; {author} and {title} are replaced. Default: "{author}. {title}".
    #[arg(long)]
    pub filename_template: Option<String>,

    /// Download format: epub or fb2. Default: epub.
    #[arg(long, value_parser = parse_file_format)]
    pub file_format: Option<FileFormat>,

    /// Print every book as a JSON line instead of downloading.
    #[arg(long)]
    pub list: bool,

    /// Suppress the progress bar (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// More log output; repeat for trace. Also prints the error cause chain.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Pause after each download in milliseconds (overrides config; default 100).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Catalog site origin (overrides config; default https://fb2-epub.ru).
    #[arg(long)]
    pub base_url: Option<String>,
}

fn parse_file_format(s: &str) -> Result<FileFormat, String> {
    match s.to_lowercase().as_str() {
        "epub" => Ok(FileFormat::Epub),
        "fb2" => Ok(FileFormat::Fb2),
        _ => Err(format!(
            "Invalid --file-format value: '{}'. Use epub or fb2.",
            s
        )),
    }
}

/// Effective settings after merging CLI flags over config over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub download: DownloadOptions,
    /// Print books as JSON lines instead of downloading.
    pub list: bool,
    /// Hide the progress bar.
    pub quiet: bool,
}

impl Settings {
    pub fn resolve(args: &Args, config: Option<&Config>) -> Self {
        let base_url = args
            .base_url
            .clone()
            .or_else(|| config.and_then(|c| c.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let user_agent = args
            .user_agent
            .clone()
            .or_else(|| config.and_then(|c| c.user_agent.clone()));
        let timeout_secs = args
            .timeout
            .or_else(|| config.and_then(|c| c.timeout_secs))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let delay_ms = args
            .delay_ms
            .or_else(|| config.and_then(|c| c.download_delay_ms))
            .unwrap_or(DEFAULT_DELAY_MS);
        let filename_template = args
            .filename_template
            .clone()
            .or_else(|| config.and_then(|c| c.filename_template.clone()))
            .unwrap_or_else(|| DEFAULT_FILENAME_TEMPLATE.to_string());
        let format = args
            .file_format
            .or_else(|| config.and_then(|c| c.file_format))
            .unwrap_or_default();

        Self {
            base_url,
            user_agent,
            timeout_secs,
            download: DownloadOptions {
                dest: args.dest.clone(),
                filename_template,
                format,
                delay: Duration::from_millis(delay_ms),
            },
            list: args.list,
            quiet: args.quiet,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u32,
    pub skipped: u32,
}

/// Destination must be an existing directory.
fn validate_dest(dest: &Path) -> Result<(), CliRunError> {
    if !dest.is_dir() {
        return Err(CliRunError::InvalidInput(format!(
            "Destination {} does not exist or is not a directory.",
            dest.display()
        )));
    }
    Ok(())
}

/// Print a numbered menu of `results` and read a 1-based choice until one is in range.
pub fn select_menu<R: BufRead, W: Write>(
    results: &[SearchResult],
    input: &mut R,
    output: &mut W,
) -> Result<String, CliRunError> {
    for (i, result) in results.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, result.title)?;
    }
    loop {
        write!(output, "Select one: ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(CliRunError::InvalidInput(
                "No author selected (end of input).".to_string(),
            ));
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=results.len()).contains(&n) => return Ok(results[n - 1].url.clone()),
            _ => writeln!(
                output,
                "Error: {:?} is not in the range 1-{}.",
                line.trim(),
                results.len()
            )?,
        }
    }
}

fn progress_bar(total: u32, quiet: bool) -> indicatif::ProgressBar {
    if quiet {
        return indicatif::ProgressBar::hidden();
    }
    let bar = indicatif::ProgressBar::new(u64::from(total));
    bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("Downloading books [{bar:40.green}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Search, disambiguate, and download (or list) every book, against any [Fetch] implementation.
///
/// `input`/`output` carry the selection menu and `--list` lines; no prompt is shown when exactly
/// one author matches.
pub fn execute<F, R, W>(
    fetcher: &F,
    settings: &Settings,
    query: &str,
    input: &mut R,
    output: &mut W,
) -> Result<RunSummary, CliRunError>
where
    F: Fetch + ?Sized,
    R: BufRead,
    W: Write,
{
    let catalog = Catalog::new(fetcher, &settings.base_url)?;
    let found: Vec<SearchResult> = catalog.search(query).collect::<Result<_, _>>()?;
    let author_url = match found.as_slice() {
        [] => {
            return Err(ScraperError::NoSearchResults {
                query: query.to_string(),
            }
            .into())
        }
        [only] => only.url.clone(),
        several => select_menu(several, input, output)?,
    };
    info!(url = %author_url, "walking author listing");

    let books = catalog.iter_books(&author_url)?;
    let mut summary = RunSummary::default();

    if settings.list {
        for book in books {
            serde_json::to_writer(&mut *output, &book?)?;
            writeln!(output)?;
        }
        return Ok(summary);
    }

    let bar = progress_bar(books.total_count(), settings.quiet);
    for book in books {
        let book = book?;
        bar.set_message(book.title.clone());
        match download_book(fetcher, &book, &settings.download)? {
            Outcome::Downloaded { .. } => summary.downloaded += 1,
            Outcome::Skipped => summary.skipped += 1,
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        "download complete"
    );
    Ok(summary)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    validate_dest(&args.dest)?;
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = Settings::resolve(args, config.as_ref());

    let mut builder = CatalogClient::builder().timeout_secs(settings.timeout_secs);
    if let Some(ua) = &settings.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    let client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout().lock();
    let summary = execute(&client, &settings, &args.query, &mut input, &mut output)?;

    if !settings.quiet && !settings.list {
        eprintln!(
            "Downloaded {} book(s) to {}",
            summary.downloaded,
            settings.download.dest.display()
        );
        if summary.skipped > 0 {
            eprintln!(
                "Skipped {} book(s) with no {} link",
                summary.skipped, settings.download.format
            );
        }
    }
    Ok(())
}
