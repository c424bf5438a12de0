//! Platform classification
//!
//! A normalized URL is classified once into a closed set of platforms, and
//! the pipeline dispatches on the result.

mod rumble;
mod youtube;

pub use rumble::{fallback_title, is_rumble_host, rumble_video_id, RUMBLE_SOURCE};
pub use youtube::{
    is_youtube_host, video_id_from_input, youtube_playlist_id, youtube_video_id, MetadataError,
    PlaylistInfo, VideoInfo, VideoMetadataApi, YouTubeDataApi, NO_KEY_CHANNEL, NO_KEY_TITLE,
    PLAYLIST_PAGE_SIZE,
};

use crate::fetch::unwrap_youtube_redirect;
use crate::RefError;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Where a URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    YouTubeVideo { video_id: String },
    YouTubePlaylist { playlist_id: String },
    Rumble { video_id: String },
    Generic,
}

impl Platform {
    /// Classifies a normalized URL
    ///
    /// # Errors
    ///
    /// * `RefError::Unsupported` - search result pages, YouTube URLs with
    ///   no video or playlist id, and Rumble URLs with no video slug
    ///
    /// # Example
    ///
    /// ```
    /// use ref_cli::Platform;
    ///
    /// assert_eq!(
    ///     Platform::classify("https://youtu.be/abc").unwrap(),
    ///     Platform::YouTubeVideo { video_id: "abc".to_string() }
    /// );
    /// assert_eq!(Platform::classify("https://example.com/").unwrap(), Platform::Generic);
    /// ```
    pub fn classify(url: &str) -> Result<Self, RefError> {
        if is_search_page(url) {
            return Err(RefError::Unsupported(format!(
                "search result pages cannot be recorded: {}",
                url
            )));
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(Self::Generic),
        };
        let host = match parsed.host_str() {
            Some(host) => host.to_lowercase(),
            None => return Ok(Self::Generic),
        };

        if is_rumble_host(&host) {
            return rumble_video_id(&parsed)
                .map(|video_id| Self::Rumble { video_id })
                .ok_or_else(|| RefError::Unsupported(format!("Invalid Rumble URL: {}", url)));
        }

        if is_youtube_host(&host) && unwrap_youtube_redirect(url).is_none() {
            if let Some(playlist_id) = youtube_playlist_id(&parsed) {
                return Ok(Self::YouTubePlaylist { playlist_id });
            }
            return youtube_video_id(&parsed)
                .map(|video_id| Self::YouTubeVideo { video_id })
                .ok_or_else(|| RefError::Unsupported("Invalid YouTube URL".to_string()));
        }

        Ok(Self::Generic)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::YouTubeVideo { .. } => "YouTube video",
            Self::YouTubePlaylist { .. } => "YouTube playlist",
            Self::Rumble { .. } => "Rumble video",
            Self::Generic => "web page",
        }
    }
}

/// Returns true for platform search result pages
pub fn is_search_page(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("youtube.com/results") || lower.contains("rumble.com/search")
}

/// Collapses every run of non-alphanumeric characters into one space
///
/// # Example
///
/// ```
/// use ref_cli::platform::sanitize_title;
///
/// assert_eq!(sanitize_title("Rust | Async: Part #2!"), "Rust Async Part 2");
/// ```
pub fn sanitize_title(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^0-9a-zA-Z]+").expect("valid title regex"));
    re.replace_all(title, " ").trim().to_string()
}
