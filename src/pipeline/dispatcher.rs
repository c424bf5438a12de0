//! Single-URL processing
//!
//! # Flow
//!
//! ```text
//! input ─▶ search page? ─▶ PDF? ─▶ resolve redirects ─▶ normalize ─▶ classify
//!                                                                     │
//!             ┌───────────────┬───────────────┬───────────────────────┤
//!             ▼               ▼               ▼                       ▼
//!       YouTube video   YouTube playlist    Rumble                 Generic
//!             └───────────────┴───────┬───────┴───────────────────────┘
//!                                     ▼
//!                                store write
//! ```

use crate::fetch::PageTitle;
use crate::platform::{
    fallback_title, is_search_page, sanitize_title, Platform, VideoInfo, RUMBLE_SOURCE,
};
use crate::pipeline::RefContext;
use crate::storage::{EntryKind, ReferenceEntry, TranscriptRef, TranscriptUpdate, WriteOutcome};
use crate::url::{is_pdf_url, pdf_title};
use crate::{RefError, Result};
use std::fmt;

/// Source label of PDF references
pub const PDF_SOURCE: &str = "PDF Document";

/// Source label of generic web pages
pub const GENERAL_SOURCE: &str = "General";

/// What happened to one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// An entry was appended or updated
    Recorded {
        url: String,
        title: String,
        write: WriteOutcome,
        transcript: Option<TranscriptRef>,
    },
    /// The URL was already stored and nothing needed updating
    AlreadyRecorded { url: String, title: Option<String> },
    /// A playlist entry plus its member videos
    Playlist {
        url: String,
        title: String,
        videos: usize,
        recorded: usize,
    },
    /// Nothing was written because the page could not be read
    Skipped { url: String, reason: String },
}

impl ProcessOutcome {
    /// True if the URL was handled and does not need another attempt
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Recorded { url, .. }
            | Self::AlreadyRecorded { url, .. }
            | Self::Playlist { url, .. }
            | Self::Skipped { url, .. } => url,
        }
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded {
                url,
                title,
                write,
                transcript,
            } => {
                let verb = match write {
                    WriteOutcome::Appended => "Added",
                    WriteOutcome::Updated => "Updated",
                    WriteOutcome::Unchanged => "Kept",
                };
                write!(f, "{} {}\nTitle: {}", verb, url, title)?;
                if let Some(transcript) = transcript {
                    write!(f, "\nTranscript: {}", transcript)?;
                }
                Ok(())
            }
            Self::AlreadyRecorded { url, title } => {
                write!(f, "URL {} already recorded.", url)?;
                if let Some(title) = title {
                    write!(f, "\nTitle: {}", title)?;
                }
                Ok(())
            }
            Self::Playlist {
                url,
                title,
                videos,
                recorded,
            } => write!(
                f,
                "Playlist {} ({})\n{} of {} videos recorded or updated",
                title, url, recorded, videos
            ),
            Self::Skipped { url, reason } => write!(f, "Skipped {}: {}", url, reason),
        }
    }
}

/// Records one URL
///
/// `force` appends a deliberate duplicate for pages and PDFs, and rewrites
/// the metadata of existing video entries (reusing any transcript artifact
/// already on disk).
///
/// # Errors
///
/// * `RefError::Unsupported` - search result pages and unrecognized video URLs
/// * `RefError::Metadata` - the metadata lookup failed
/// * `RefError::Storage` - the store could not be read or written (fatal)
pub async fn process_url(ctx: &mut RefContext, raw: &str, force: bool) -> Result<ProcessOutcome> {
    let raw = raw.trim();
    tracing::debug!("Original URL: {}", raw);

    if raw.is_empty() {
        return Err(RefError::Unsupported("empty URL".to_string()));
    }
    if is_search_page(raw) {
        return Err(RefError::Unsupported(format!(
            "search result pages are not supported: {}",
            raw
        )));
    }

    if is_pdf_url(raw) {
        return record_pdf(ctx, raw, force);
    }

    let resolved = ctx.resolver.resolve(raw).await;
    tracing::debug!("Resolved URL: {}", resolved);
    let url = ctx.normalizer.normalize(&resolved);
    tracing::debug!("Normalized URL: {}", url);

    let platform = Platform::classify(&url)?;
    tracing::debug!("Classified {} as {}", url, platform.name());

    match platform {
        Platform::YouTubeVideo { video_id } => {
            let info = ctx.metadata.video(&video_id).await?;
            record_video(ctx, &info, force).await
        }
        Platform::YouTubePlaylist { playlist_id } => {
            record_playlist(ctx, &url, &playlist_id, force).await
        }
        Platform::Rumble { video_id } => record_rumble(ctx, &url, &video_id, force).await,
        Platform::Generic => record_page(ctx, &url, force).await,
    }
}

fn record_pdf(ctx: &mut RefContext, raw: &str, force: bool) -> Result<ProcessOutcome> {
    let url = ctx.normalizer.normalize(raw);
    let title = pdf_title(raw);

    if !force && ctx.store.exists(&url)? {
        tracing::info!("Duplicate URL: {}", url);
        return Ok(ProcessOutcome::AlreadyRecorded {
            url,
            title: Some(title),
        });
    }

    let entry = ReferenceEntry::new(&url, &title, PDF_SOURCE, EntryKind::General);
    ctx.store.append(&entry)?;
    tracing::info!("Added PDF URL: {}", url);
    Ok(ProcessOutcome::Recorded {
        url,
        title,
        write: WriteOutcome::Appended,
        transcript: None,
    })
}

async fn record_page(ctx: &mut RefContext, url: &str, force: bool) -> Result<ProcessOutcome> {
    let title = match ctx.titles.extract_title(url).await {
        Ok(title) => title,
        Err(e) => {
            tracing::error!("Title extraction failed for {}: {}", url, e);
            return Ok(ProcessOutcome::Skipped {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }
    };
    let title = title.to_string();

    if !force && ctx.store.exists(url)? {
        tracing::info!("Duplicate URL: {}", url);
        return Ok(ProcessOutcome::AlreadyRecorded {
            url: url.to_string(),
            title: Some(title),
        });
    }

    let entry = ReferenceEntry::new(url, &title, GENERAL_SOURCE, EntryKind::General);
    ctx.store.append(&entry)?;
    tracing::info!("Added URL: {}", url);
    Ok(ProcessOutcome::Recorded {
        url: url.to_string(),
        title,
        write: WriteOutcome::Appended,
        transcript: None,
    })
}

/// A video entry about to be written
struct VideoTarget<'a> {
    url: String,
    /// Video id or URL handed to the transcript fetcher
    transcript_key: String,
    title: String,
    source: String,
    kind: EntryKind,
    metadata: Option<&'a VideoInfo>,
}

async fn record_video(ctx: &mut RefContext, info: &VideoInfo, force: bool) -> Result<ProcessOutcome> {
    let target = VideoTarget {
        url: ctx.normalizer.normalize(&info.watch_url()),
        transcript_key: info.id.clone(),
        title: sanitize_title(&info.title),
        source: info.channel.clone(),
        kind: EntryKind::YouTube,
        metadata: Some(info),
    };
    record_with_transcript(ctx, target, force).await
}

async fn record_rumble(
    ctx: &mut RefContext,
    url: &str,
    video_id: &str,
    force: bool,
) -> Result<ProcessOutcome> {
    let title = match ctx.titles.extract_title(url).await {
        Ok(PageTitle::Found(title)) => title,
        Ok(PageTitle::NotFound) => fallback_title(video_id),
        Err(e) => {
            tracing::warn!("Title extraction failed for {}: {}", url, e);
            fallback_title(video_id)
        }
    };

    let target = VideoTarget {
        url: url.to_string(),
        transcript_key: url.to_string(),
        title,
        source: RUMBLE_SOURCE.to_string(),
        kind: EntryKind::General,
        metadata: None,
    };
    record_with_transcript(ctx, target, force).await
}

/// Writes a video entry with its transcript reference
///
/// The entry is written when the URL is new, when forced, when no artifact
/// exists yet, or when the stored entry has no transcript. An artifact
/// already on disk is reused instead of fetched again.
async fn record_with_transcript(
    ctx: &mut RefContext,
    target: VideoTarget<'_>,
    force: bool,
) -> Result<ProcessOutcome> {
    let exists = ctx.store.exists(&target.url)?;
    let has_transcript = exists && ctx.store.has_transcript(&target.url)?;
    let artifact = ctx.transcripts.existing_artifact(&target.transcript_key);

    if exists && !force && artifact.is_some() && has_transcript {
        tracing::info!("Duplicate URL: {}", target.url);
        return Ok(ProcessOutcome::AlreadyRecorded {
            url: target.url,
            title: Some(target.title),
        });
    }

    let transcript = match artifact {
        Some(path) => {
            tracing::debug!("Reusing transcript {}", path.display());
            TranscriptRef::Artifact(path)
        }
        None => fetch_transcript_ref(ctx, &target.transcript_key, target.metadata, &target.url).await,
    };

    let entry = ReferenceEntry::new(&target.url, &target.title, &target.source, target.kind)
        .with_transcript(transcript.clone());
    let write = ctx.store.upsert(&entry, force)?;
    tracing::info!("{:?} entry for {}", write, target.url);

    Ok(ProcessOutcome::Recorded {
        url: target.url,
        title: target.title,
        write,
        transcript: Some(transcript),
    })
}

async fn fetch_transcript_ref(
    ctx: &RefContext,
    key: &str,
    metadata: Option<&VideoInfo>,
    url: &str,
) -> TranscriptRef {
    match ctx.transcripts.fetch_transcript(key, metadata).await {
        Ok(path) => TranscriptRef::Artifact(path),
        Err(failure) => {
            tracing::error!("Transcript retrieval failed for {}: {}", url, failure);
            TranscriptRef::from(&failure)
        }
    }
}

async fn record_playlist(
    ctx: &mut RefContext,
    url: &str,
    playlist_id: &str,
    force: bool,
) -> Result<ProcessOutcome> {
    let playlist = ctx.metadata.playlist(playlist_id).await?;
    let title = sanitize_title(&playlist.title);

    if force || !ctx.store.exists(url)? {
        let entry = ReferenceEntry::new(url, &title, &playlist.channel, EntryKind::YouTube);
        let write = ctx.store.upsert(&entry, force)?;
        tracing::info!("{:?} playlist entry for {}", write, url);
    }

    let mut recorded = 0;
    for video in &playlist.videos {
        let outcome = record_video(ctx, video, force).await?;
        if matches!(outcome, ProcessOutcome::Recorded { .. }) {
            recorded += 1;
        }
        tracing::info!("{}", outcome);
    }

    Ok(ProcessOutcome::Playlist {
        url: url.to_string(),
        title,
        videos: playlist.videos.len(),
        recorded,
    })
}

/// Result of a `--transcript` refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Attached { url: String, transcript: TranscriptRef },
    AlreadyPresent { url: String },
    NotRecorded { url: String },
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attached { url, transcript } => {
                write!(f, "Transcript for {}: {}", url, transcript)
            }
            Self::AlreadyPresent { url } => write!(f, "{} already has a transcript.", url),
            Self::NotRecorded { url } => {
                write!(f, "{} is not recorded yet; add it first.", url)
            }
        }
    }
}

/// Re-attempts the transcript of an already recorded video
///
/// Only entries whose slot is absent, pending or a failure are fetched
/// again; a stored artifact path is left alone.
pub async fn refresh_transcript(ctx: &mut RefContext, raw: &str) -> Result<RefreshOutcome> {
    let resolved = ctx.resolver.resolve(raw.trim()).await;
    let normalized = ctx.normalizer.normalize(&resolved);

    let (url, key, metadata) = match Platform::classify(&normalized)? {
        Platform::YouTubeVideo { video_id } => {
            let info = ctx.metadata.video(&video_id).await?;
            (ctx.normalizer.normalize(&info.watch_url()), video_id, Some(info))
        }
        Platform::Rumble { .. } => (normalized.clone(), normalized, None),
        Platform::YouTubePlaylist { .. } | Platform::Generic => {
            return Err(RefError::Unsupported(format!(
                "transcripts are only available for single videos: {}",
                raw.trim()
            )))
        }
    };

    let Some(entry) = ctx.store.find(&url)? else {
        return Ok(RefreshOutcome::NotRecorded { url });
    };
    if matches!(entry.transcript, Some(TranscriptRef::Artifact(_))) {
        return Ok(RefreshOutcome::AlreadyPresent { url });
    }

    let transcript = match ctx.transcripts.existing_artifact(&key) {
        Some(path) => TranscriptRef::Artifact(path),
        None => fetch_transcript_ref(ctx, &key, metadata.as_ref(), &url).await,
    };

    match ctx.store.update_transcript(&url, &transcript)? {
        TranscriptUpdate::Attached => Ok(RefreshOutcome::Attached { url, transcript }),
        TranscriptUpdate::AlreadyPresent => Ok(RefreshOutcome::AlreadyPresent { url }),
        TranscriptUpdate::NoEntry => Ok(RefreshOutcome::NotRecorded { url }),
    }
}
