//! URL handling module for ref-cli
//!
//! This module provides URL normalization (the deduplication key of the
//! reference store), domain extraction, and wildcard domain matching.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::{normalize_url, Normalizer};

/// Returns true if the URL's path ends in `.pdf` (case-insensitive)
///
/// Query strings and fragments are ignored, so `report.pdf?dl=1` counts.
pub fn is_pdf_url(url_str: &str) -> bool {
    let path = match ::url::Url::parse(url_str.trim()) {
        Ok(url) => url.path().to_string(),
        Err(_) => url_str
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.to_lowercase().ends_with(".pdf")
}

/// Title for a PDF reference: the last path segment, percent-decoded
pub fn pdf_title(url_str: &str) -> String {
    let segment = ::url::Url::parse(url_str.trim())
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| {
            url_str
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    let decoded = urlencoding::decode(&segment).map(|d| d.into_owned());
    decoded.unwrap_or(segment)
}
