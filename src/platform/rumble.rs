//! Rumble identifiers

use crate::url::matches_wildcard;
use url::Url;

/// Source label recorded for Rumble references
pub const RUMBLE_SOURCE: &str = "Rumble";

/// Returns true for `rumble.com` and its subdomains
pub fn is_rumble_host(host: &str) -> bool {
    matches_wildcard("*.rumble.com", &host.to_lowercase())
}

/// Extracts the video slug from a Rumble URL
///
/// The first path segment is the id (`/v4abc12-some-title.html` →
/// `v4abc12-some-title`); embed links use the segment after `embed`.
pub fn rumble_video_id(url: &Url) -> Option<String> {
    if !url.host_str().map(is_rumble_host).unwrap_or(false) {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    let slug = if first == "embed" {
        segments.next()?
    } else {
        first
    };
    let slug = slug.strip_suffix(".html").unwrap_or(slug).trim();
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Fallback title when the page title cannot be extracted
pub fn fallback_title(video_id: &str) -> String {
    format!("Rumble video {}", video_id)
}
