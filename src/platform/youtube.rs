//! YouTube identifiers and metadata lookups
//!
//! Metadata comes from the YouTube Data API v3. Without an API key, single
//! video lookups degrade to placeholder text so the reference can still be
//! recorded; playlists need the key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Title recorded for a video when no API key is configured
pub const NO_KEY_TITLE: &str = "Title unavailable (no API key)";

/// Channel recorded for a video when no API key is configured
pub const NO_KEY_CHANNEL: &str = "Channel unavailable (no API key)";

/// Page size used when listing playlist members
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Errors from metadata lookups
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("YouTube API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No YouTube video with id {0}")]
    VideoNotFound(String),

    #[error("Invalid YouTube Playlist ID: {0}")]
    PlaylistNotFound(String),

    #[error("YOUTUBE_API_KEY is required for {0}")]
    MissingApiKey(&'static str),
}

/// Metadata of one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub published_at: Option<String>,
}

impl VideoInfo {
    /// Placeholder metadata used when no API key is available
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: NO_KEY_TITLE.to_string(),
            channel: NO_KEY_CHANNEL.to_string(),
            published_at: None,
        }
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Metadata of a playlist and its members, in playlist order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub videos: Vec<VideoInfo>,
}

/// Source of video and playlist metadata
#[async_trait]
pub trait VideoMetadataApi: Send + Sync {
    async fn video(&self, video_id: &str) -> Result<VideoInfo, MetadataError>;

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, MetadataError>;
}

/// YouTube Data API v3 client
pub struct YouTubeDataApi {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Item<T>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Item<T> {
    snippet: T,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "videoOwnerChannelTitle")]
    video_owner_channel_title: Option<String>,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

impl YouTubeDataApi {
    /// Creates a client; `api_key` usually comes from `YOUTUBE_API_KEY`
    pub fn new(client: Client, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Reads the key from the `YOUTUBE_API_KEY` environment variable
    pub fn from_env(client: Client, api_base: impl Into<String>) -> Self {
        Self::new(client, api_base, std::env::var(crate::config::API_KEY_VAR).ok())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        key: &str,
        params: &[(&str, &str)],
    ) -> Result<ListResponse<T>, MetadataError> {
        let url = format!("{}/{}", self.api_base, resource);
        let mut query: Vec<(&str, &str)> = vec![("part", "snippet"), ("key", key)];
        query.extend_from_slice(params);

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api {
                status: status.as_u16(),
                message: message.trim().chars().take(200).collect(),
            });
        }
        Ok(response.json::<ListResponse<T>>().await?)
    }
}

#[async_trait]
impl VideoMetadataApi for YouTubeDataApi {
    async fn video(&self, video_id: &str) -> Result<VideoInfo, MetadataError> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::warn!("YOUTUBE_API_KEY not set, recording placeholder metadata");
            return Ok(VideoInfo::placeholder(video_id));
        };

        let response: ListResponse<Snippet> =
            self.list("videos", key, &[("id", video_id)]).await?;
        let snippet = response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| MetadataError::VideoNotFound(video_id.to_string()))?;

        Ok(VideoInfo {
            id: video_id.to_string(),
            title: snippet.title,
            channel: snippet.channel_title,
            published_at: snippet.published_at,
        })
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, MetadataError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(MetadataError::MissingApiKey("playlists"))?;

        let header: ListResponse<Snippet> =
            self.list("playlists", key, &[("id", playlist_id)]).await?;
        let snippet = header
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| MetadataError::PlaylistNotFound(playlist_id.to_string()))?;

        let page_size = PLAYLIST_PAGE_SIZE.to_string();
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens: HashSet<String> = HashSet::new();
        loop {
            let mut params = vec![("playlistId", playlist_id), ("maxResults", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let page: ListResponse<PlaylistItemSnippet> =
                self.list("playlistItems", key, &params).await?;

            for item in page.items {
                let member = item.snippet;
                // Deleted and private videos have no id
                let Some(id) = member.resource_id.video_id else {
                    continue;
                };
                videos.push(VideoInfo {
                    id,
                    title: member.title,
                    channel: member
                        .video_owner_channel_title
                        .unwrap_or(member.channel_title),
                    published_at: member.published_at,
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        tracing::warn!(
                            "Playlist {} repeated page token {}; stopping pagination",
                            playlist_id,
                            token
                        );
                        break;
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(
            "Playlist {} has {} videos",
            playlist_id,
            videos.len()
        );
        Ok(PlaylistInfo {
            id: playlist_id.to_string(),
            title: snippet.title,
            channel: snippet.channel_title,
            videos,
        })
    }
}

const YOUTUBE_HOSTS: &[&str] = &["*.youtube.com", "youtu.be", "*.youtube-nocookie.com"];

/// Returns true for YouTube hosts, including `youtu.be`
pub fn is_youtube_host(host: &str) -> bool {
    crate::url::matches_any(YOUTUBE_HOSTS, &host.to_lowercase())
}

/// Extracts a video id from a YouTube URL
///
/// Recognizes `watch?v=<id>`, `/shorts/<id>`, `/live/<id>`, `/embed/<id>`
/// and `youtu.be/<id>`.
pub fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    if host.eq_ignore_ascii_case("youtu.be") {
        return url
            .path_segments()?
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        let v = v.trim();
        if !v.is_empty() {
            return Some(v.to_string());
        }
    }

    let mut segments = url.path_segments()?;
    let kind = segments.next().unwrap_or("");
    let id = segments.next().unwrap_or("").trim();
    if matches!(kind, "shorts" | "live" | "embed") && !id.is_empty() {
        return Some(id.to_string());
    }

    None
}

/// Extracts the `list` parameter of a YouTube URL
pub fn youtube_playlist_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "list")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts a bare video id or any supported YouTube URL
///
/// Bare ids are returned trimmed; URLs without a recognizable id yield None.
pub fn video_id_from_input(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => youtube_video_id(&url),
        Err(_) if !input.contains('/') => Some(input.to_string()),
        Err(_) => None,
    }
}
