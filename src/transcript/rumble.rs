//! Rumble subtitle acquisition
//!
//! Rumble has no caption API, so subtitles come from the external
//! downloader. Auto-generated captions are tried first, then manual ones,
//! then anything at all.

use crate::tool::{run_tool, ToolError};
use crate::transcript::artifact::is_nonempty_file;
use crate::transcript::youtube::{classify_stderr, TranscriptApiError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Subtitle extensions checked after each strategy, in order
pub const SUBTITLE_EXTENSIONS: [&str; 3] = ["en-auto.vtt", "en.vtt", "vtt"];

/// Which subtitles a download attempt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleStrategy {
    AutoOnly,
    ManualOnly,
    All,
}

impl SubtitleStrategy {
    pub const ORDER: [SubtitleStrategy; 3] = [Self::AutoOnly, Self::ManualOnly, Self::All];

    /// Downloader flags selecting the subtitles
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Self::AutoOnly => &["--write-auto-subs", "--sub-langs", "en.*"],
            Self::ManualOnly => &["--write-subs", "--sub-langs", "en.*"],
            Self::All => &["--write-subs", "--write-auto-subs", "--sub-langs", "all"],
        }
    }
}

/// External subtitle downloader
#[async_trait]
pub trait SubtitleDownloader: Send + Sync {
    /// Method tag recorded when the downloader fails
    fn name(&self) -> &str;

    /// Info-only request confirming the downloader can see the video
    async fn check_video(&self, url: &str) -> Result<(), TranscriptApiError>;

    /// Downloads subtitles next to `output_stem` (`<stem>.<lang>.vtt`)
    async fn download(
        &self,
        url: &str,
        strategy: SubtitleStrategy,
        output_stem: &Path,
    ) -> Result<(), TranscriptApiError>;
}

/// `yt-dlp` as a subtitle downloader
pub struct YtDlpDownloader {
    program: String,
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<(), TranscriptApiError> {
        let output = run_tool(&self.program, &args, self.timeout).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(classify_stderr(&String::from_utf8_lossy(&output.stderr)))
        }
    }
}

#[async_trait]
impl SubtitleDownloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt_dlp"
    }

    async fn check_video(&self, url: &str) -> Result<(), TranscriptApiError> {
        self.run(vec![
            "--skip-download".to_string(),
            "--simulate".to_string(),
            "--no-warnings".to_string(),
            "--print".to_string(),
            "id".to_string(),
            url.to_string(),
        ])
        .await
    }

    async fn download(
        &self,
        url: &str,
        strategy: SubtitleStrategy,
        output_stem: &Path,
    ) -> Result<(), TranscriptApiError> {
        let mut args = vec!["--skip-download".to_string(), "--no-warnings".to_string()];
        args.extend(strategy.args().iter().map(|a| a.to_string()));
        args.extend([
            "--sub-format".to_string(),
            "vtt".to_string(),
            "-o".to_string(),
            format!("{}.%(ext)s", output_stem.to_string_lossy()),
            url.to_string(),
        ]);
        self.run(args).await
    }
}

/// Candidate subtitle files for a stem, in preference order
pub fn subtitle_candidates(output_stem: &Path) -> Vec<PathBuf> {
    let stem = output_stem.to_string_lossy();
    SUBTITLE_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{}.{}", stem, ext)))
        .collect()
}

/// First non-empty candidate subtitle file, if any
pub fn find_subtitle(output_stem: &Path) -> Option<PathBuf> {
    subtitle_candidates(output_stem)
        .into_iter()
        .find(|path| is_nonempty_file(path))
}

/// Runs the availability check and then every strategy until a subtitle file appears
///
/// Returns the subtitle path, or the last downloader error. A missing
/// downloader stops immediately since no later strategy can succeed.
pub async fn download_rumble_subtitles(
    downloader: &dyn SubtitleDownloader,
    url: &str,
    output_stem: &Path,
) -> Result<PathBuf, TranscriptApiError> {
    downloader.check_video(url).await?;

    let mut last_error: Option<TranscriptApiError> = None;
    for strategy in SubtitleStrategy::ORDER {
        tracing::debug!("Trying {:?} subtitles for {}", strategy, url);
        match downloader.download(url, strategy, output_stem).await {
            Ok(()) => {}
            Err(TranscriptApiError::Tool(ToolError::NotFound(program))) => {
                return Err(TranscriptApiError::Tool(ToolError::NotFound(program)));
            }
            Err(e) => {
                tracing::debug!("{:?} subtitles failed for {}: {}", strategy, url, e);
                last_error = Some(e);
            }
        }
        if let Some(path) = find_subtitle(output_stem) {
            tracing::info!("Found {:?} subtitles at {}", strategy, path.display());
            return Ok(path);
        }
    }

    Err(last_error.unwrap_or_else(|| {
        TranscriptApiError::NoTranscript("No subtitles produced by any strategy".to_string())
    }))
}
