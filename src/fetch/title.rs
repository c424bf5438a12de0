//! Page title extraction
//!
//! Pages are dumped as raw markup by an external text browser (no
//! JavaScript) and the title is picked from the markup with `scraper`.

use crate::tool::{last_line, run_tool, ToolError};
use crate::url::{domain_of, matches_wildcard};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Sentinel recorded when a page has no usable title
pub const NO_TITLE_SENTINEL: &str = "No title found";

/// Title extracted from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTitle {
    Found(String),
    NotFound,
}

impl PageTitle {
    /// Text written to the store
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(title) => title,
            Self::NotFound => NO_TITLE_SENTINEL,
        }
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a title could not be extracted at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("Error: {0} is not installed")]
    MissingTool(String),

    #[error("Error: Request timed out")]
    Timeout,

    #[error("Error: Unable to access document")]
    DeadLink,

    #[error("Error: Too many redirections")]
    TooManyRedirects,

    #[error("Error: Subprocess error - {0}")]
    Subprocess(String),

    #[error("Error: Unexpected error - {0}")]
    Unexpected(String),
}

impl From<ToolError> for TitleError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(program) => Self::MissingTool(program),
            ToolError::Timeout { .. } => Self::Timeout,
            ToolError::Io { .. } => Self::Unexpected(err.to_string()),
        }
    }
}

/// Produces the raw markup of a page
#[async_trait]
pub trait PageDumper: Send + Sync {
    async fn dump(&self, url: &str) -> Result<String, TitleError>;
}

/// Dumps pages with `lynx -source`
pub struct LynxDumper {
    program: String,
    timeout: Duration,
}

impl LynxDumper {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PageDumper for LynxDumper {
    async fn dump(&self, url: &str) -> Result<String, TitleError> {
        let args = [
            "-source",
            "-display_charset=UTF-8",
            "-assume_charset=UTF-8",
            url,
        ];
        let output = run_tool(&self.program, args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                "{} failed with status {}: {}",
                self.program,
                output.status,
                last_line(&stderr)
            );
            return Err(classify_dump_failure(&stderr, output.status.code()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Maps a failed dump's stderr to a title error
fn classify_dump_failure(stderr: &str, code: Option<i32>) -> TitleError {
    let lower = stderr.to_lowercase();
    if lower.contains("unable to access document") || lower.contains("can't access") {
        TitleError::DeadLink
    } else if lower.contains("redirection limit") || lower.contains("too many redirections") {
        TitleError::TooManyRedirects
    } else {
        let detail = match last_line(stderr) {
            "" => format!(
                "exit code {}",
                code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".into())
            ),
            line => line.to_string(),
        };
        TitleError::Subprocess(detail)
    }
}

/// Picks the best title from page markup
///
/// # Selection Order
///
/// 1. Rumble pages: `og:title`, then the first `<h1>`
/// 2. `<title>`
/// 3. `<meta property="og:title">`
/// 4. `<meta name="twitter:title">`
/// 5. First `<h1>`
///
/// Whitespace inside the chosen title is collapsed.
///
/// # Example
///
/// ```
/// use ref_cli::fetch::{parse_title, PageTitle};
///
/// let html = "<html><head><title> Hello\n  World </title></head></html>";
/// assert_eq!(
///     parse_title(html, "https://example.com/"),
///     PageTitle::Found("Hello World".to_string())
/// );
/// ```
pub fn parse_title(html: &str, url: &str) -> PageTitle {
    let document = Html::parse_document(html);

    let is_rumble = domain_of(url)
        .map(|host| matches_wildcard("*.rumble.com", &host))
        .unwrap_or(false);
    if is_rumble {
        if let Some(title) = meta_content(&document, "meta[property='og:title']")
            .or_else(|| element_text(&document, "h1"))
        {
            return PageTitle::Found(title);
        }
    }

    element_text(&document, "title")
        .or_else(|| meta_content(&document, "meta[property='og:title']"))
        .or_else(|| meta_content(&document, "meta[name='twitter:title']"))
        .or_else(|| element_text(&document, "h1"))
        .map(PageTitle::Found)
        .unwrap_or(PageTitle::NotFound)
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetches a page through a dumper and extracts its title
pub struct TitleExtractor {
    dumper: Box<dyn PageDumper>,
}

impl TitleExtractor {
    pub fn new(dumper: Box<dyn PageDumper>) -> Self {
        Self { dumper }
    }

    /// Extracts the title of the page at `url`
    pub async fn extract_title(&self, url: &str) -> Result<PageTitle, TitleError> {
        let html = self.dumper.dump(url).await?;
        let title = parse_title(&html, url);
        match &title {
            PageTitle::Found(found) => tracing::info!("Title found: {}", found),
            PageTitle::NotFound => tracing::warn!("No suitable title found in {}", url),
        }
        Ok(title)
    }
}
