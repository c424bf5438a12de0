//! YouTube caption acquisition

use crate::tool::{last_line, run_tool, ToolError};
use crate::transcript::artifact::Segment;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors from a transcript source
#[derive(Debug, Error)]
pub enum TranscriptApiError {
    /// The platform refused automated access (bot check, IP block, 429)
    #[error("{0}")]
    Blocked(String),

    #[error("{0}")]
    NoTranscript(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of timed caption segments for a YouTube video
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Method tag recorded when this source fails
    fn name(&self) -> &str;

    async fn fetch(&self, video_id: &str) -> Result<Vec<Segment>, TranscriptApiError>;
}

/// Fetches English captions by running `yt-dlp` and parsing its VTT output
pub struct YtDlpTranscriptApi {
    program: String,
    timeout: Duration,
}

impl YtDlpTranscriptApi {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TranscriptApi for YtDlpTranscriptApi {
    fn name(&self) -> &str {
        "yt_dlp"
    }

    async fn fetch(&self, video_id: &str) -> Result<Vec<Segment>, TranscriptApiError> {
        let scratch = tempfile::tempdir()?;
        let template = scratch.path().join("%(id)s.%(ext)s");
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let args = vec![
            "--skip-download".to_string(),
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            "en,en-US,en-orig".to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            url,
        ];
        let output = run_tool(&self.program, &args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        let Some(vtt_path) = first_vtt(scratch.path())? else {
            return Err(TranscriptApiError::NoTranscript(
                "No English subtitles found".to_string(),
            ));
        };
        let segments = parse_vtt(&std::fs::read_to_string(&vtt_path)?);
        if segments.is_empty() {
            return Err(TranscriptApiError::NoTranscript(
                "Subtitle file contained no text".to_string(),
            ));
        }
        tracing::debug!("Parsed {} caption segments for {}", segments.len(), video_id);
        Ok(segments)
    }
}

/// Maps downloader stderr to a blocked or generic failure
pub fn classify_stderr(stderr: &str) -> TranscriptApiError {
    let lower = stderr.to_lowercase();
    let blocked = [
        "sign in to confirm",
        "not a bot",
        "http error 429",
        "too many requests",
        "blocking requests",
    ]
    .iter()
    .any(|marker| lower.contains(marker));

    let line = match last_line(stderr) {
        "" => "downloader exited without output".to_string(),
        line => line.to_string(),
    };
    if blocked {
        TranscriptApiError::Blocked(line)
    } else {
        TranscriptApiError::NoTranscript(line)
    }
}

fn first_vtt(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("vtt"))
        .collect();
    // Manual `.en.vtt` sorts before `.en-orig.vtt` and friends
    found.sort();
    Ok(found.into_iter().next())
}

/// Parses WebVTT captions into segments
///
/// Cue settings, inline tags and the rolling duplicate lines of
/// auto-generated captions are dropped.
pub fn parse_vtt(vtt: &str) -> Vec<Segment> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid vtt tag regex"));

    let mut segments: Vec<Segment> = Vec::new();
    let mut last_text: Option<String> = None;
    let mut lines = vtt.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((start, end)) = parse_cue_timing(line) else {
            continue;
        };

        let mut text_lines = Vec::new();
        while let Some(&next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            let cleaned = tag.replace_all(next, "");
            let cleaned = decode_entities(cleaned.trim());
            if !cleaned.is_empty() && last_text.as_deref() != Some(cleaned.as_str()) {
                last_text = Some(cleaned.clone());
                text_lines.push(cleaned);
            }
            lines.next();
        }

        if !text_lines.is_empty() {
            segments.push(Segment {
                text: text_lines.join(" "),
                start,
                duration: (end - start).max(0.0),
            });
        }
    }

    segments
}

fn parse_cue_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// `HH:MM:SS.mmm` or `MM:SS.mmm` to seconds
fn parse_timestamp(ts: &str) -> Option<f64> {
    let parts: Vec<&str> = ts.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, *s),
        [m, s] => (0.0, m.parse::<f64>().ok()?, *s),
        _ => return None,
    };
    let s = s.replace(',', ".").parse::<f64>().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
