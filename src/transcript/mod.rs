//! Transcript acquisition
//!
//! This module handles:
//! - Fetching YouTube captions and writing JSON transcript artifacts
//! - Downloading Rumble subtitles with fallback strategies
//! - Describing failures in a form the reference store can record
//! - Validating artifacts already on disk

mod artifact;
mod check;
mod failure;
mod rumble;
mod youtube;

pub use artifact::{
    artifact_path, is_nonempty_file, sanitize_id, ArtifactMetadata, Segment, TranscriptArtifact,
    NO_KEY_DATE,
};
pub use check::{check_artifacts, ArtifactProblem, ArtifactReport, ProblemKind};
pub use failure::{
    format_transcript_failure, TranscriptFailure, BLOCKED_METHOD, UNKNOWN_DETAIL,
};
pub use rumble::{
    download_rumble_subtitles, find_subtitle, subtitle_candidates, SubtitleDownloader,
    SubtitleStrategy, YtDlpDownloader, SUBTITLE_EXTENSIONS,
};
pub use youtube::{classify_stderr, parse_vtt, TranscriptApi, TranscriptApiError, YtDlpTranscriptApi};

use crate::config::ToolsConfig;
use crate::platform::{rumble_video_id, video_id_from_input, VideoInfo};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Fetches transcripts and stores them under one directory
pub struct TranscriptFetcher {
    dir: PathBuf,
    api: Box<dyn TranscriptApi>,
    downloader: Box<dyn SubtitleDownloader>,
}

/// Platform-specific target of a fetch
enum Target {
    YouTube { video_id: String },
    Rumble { url: String, stem: String },
}

impl TranscriptFetcher {
    pub fn new(
        dir: impl Into<PathBuf>,
        api: Box<dyn TranscriptApi>,
        downloader: Box<dyn SubtitleDownloader>,
    ) -> Self {
        Self {
            dir: dir.into(),
            api,
            downloader,
        }
    }

    /// Builds a fetcher that drives the configured downloader binary
    pub fn from_tools(dir: impl Into<PathBuf>, tools: &ToolsConfig) -> Self {
        let timeout = Duration::from_secs(tools.transcript_timeout_secs);
        Self::new(
            dir,
            Box::new(YtDlpTranscriptApi::new(tools.downloader.clone(), timeout)),
            Box::new(YtDlpDownloader::new(tools.downloader.clone(), timeout)),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetches a transcript and returns the artifact path
    ///
    /// `id_or_url` is a YouTube video id, a YouTube URL, or a Rumble URL.
    /// `metadata` fills the artifact's metadata block for YouTube videos.
    pub async fn fetch_transcript(
        &self,
        id_or_url: &str,
        metadata: Option<&VideoInfo>,
    ) -> Result<PathBuf, TranscriptFailure> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| TranscriptFailure::new("artifact", e.to_string()))?;

        match resolve_target(id_or_url) {
            Target::YouTube { video_id } => self.fetch_youtube(&video_id, metadata).await,
            Target::Rumble { url, stem } => self.fetch_rumble(&url, &stem).await,
        }
    }

    /// Path of an already-fetched transcript for this video, if one exists
    pub fn existing_artifact(&self, id_or_url: &str) -> Option<PathBuf> {
        match resolve_target(id_or_url) {
            Target::YouTube { video_id } => {
                Some(artifact_path(&self.dir, &video_id)).filter(|p| is_nonempty_file(p))
            }
            Target::Rumble { stem, .. } => find_subtitle(&self.dir.join(stem)),
        }
    }

    async fn fetch_youtube(
        &self,
        video_id: &str,
        metadata: Option<&VideoInfo>,
    ) -> Result<PathBuf, TranscriptFailure> {
        tracing::info!("Fetching transcript for YouTube video {}", video_id);

        let segments = self
            .api
            .fetch(video_id)
            .await
            .map_err(|e| self.failure(self.api.name(), e))?;

        let artifact = TranscriptArtifact::from_segments(video_id, &segments, metadata);
        let path = artifact_path(&self.dir, video_id);
        artifact
            .write_to(&path)
            .map_err(|e| TranscriptFailure::new("artifact", e.to_string()))?;

        tracing::info!("Transcript saved to {}", path.display());
        Ok(path)
    }

    async fn fetch_rumble(&self, url: &str, stem: &str) -> Result<PathBuf, TranscriptFailure> {
        tracing::info!("Fetching subtitles for Rumble video {}", stem);

        let output_stem = self.dir.join(stem);
        download_rumble_subtitles(self.downloader.as_ref(), url, &output_stem)
            .await
            .map_err(|e| self.failure(self.downloader.name(), e))
    }

    fn failure(&self, method: &str, err: TranscriptApiError) -> TranscriptFailure {
        let failure = match &err {
            TranscriptApiError::Blocked(detail) => TranscriptFailure::blocked(detail.clone()),
            other => TranscriptFailure::new(method, other.to_string()),
        };
        tracing::warn!("{}", failure);
        failure
    }
}

fn resolve_target(id_or_url: &str) -> Target {
    let input = id_or_url.trim();
    if input.contains("rumble.com") {
        let stem = Url::parse(input)
            .ok()
            .and_then(|url| rumble_video_id(&url))
            .unwrap_or_else(|| input.to_string());
        return Target::Rumble {
            url: input.to_string(),
            stem: sanitize_id(&stem),
        };
    }

    let video_id = video_id_from_input(input).unwrap_or_else(|| input.to_string());
    Target::YouTube {
        video_id: sanitize_id(&video_id),
    }
}
