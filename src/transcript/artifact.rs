//! Transcript artifact files

use crate::platform::{VideoInfo, NO_KEY_CHANNEL, NO_KEY_TITLE};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Published date recorded when no API key is available
pub const NO_KEY_DATE: &str = "Date unavailable (no API key)";

/// One timed piece of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
}

/// JSON document written for every fetched YouTube transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptArtifact {
    pub transcript: String,
    /// Total length of all segments in whole seconds
    pub duration: u64,
    pub comments: Vec<serde_json::Value>,
    pub metadata: ArtifactMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub published_at: String,
}

impl TranscriptArtifact {
    /// Builds the artifact from segments and whatever metadata is known
    pub fn from_segments(video_id: &str, segments: &[Segment], info: Option<&VideoInfo>) -> Self {
        let transcript = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let duration = segments.iter().map(|s| s.duration.max(0.0)).sum::<f64>() as u64;

        let metadata = match info {
            Some(info) => ArtifactMetadata {
                id: video_id.to_string(),
                title: info.title.clone(),
                channel: info.channel.clone(),
                published_at: info
                    .published_at
                    .clone()
                    .unwrap_or_else(|| NO_KEY_DATE.to_string()),
            },
            None => ArtifactMetadata {
                id: video_id.to_string(),
                title: NO_KEY_TITLE.to_string(),
                channel: NO_KEY_CHANNEL.to_string(),
                published_at: NO_KEY_DATE.to_string(),
            },
        };

        Self {
            transcript,
            duration,
            comments: Vec::new(),
            metadata,
        }
    }

    /// Writes the artifact as pretty JSON, replacing any previous file atomically
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Content problems that deserialization alone does not catch
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.transcript.trim().is_empty() {
            errors.push("'transcript' is empty".to_string());
        }
        if self.metadata.id.trim().is_empty() {
            errors.push("Metadata 'id' is empty".to_string());
        }
        errors
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`
///
/// # Example
///
/// ```
/// use ref_cli::transcript::sanitize_id;
///
/// assert_eq!(sanitize_id("abc/../d?e"), "abc_.._d_e");
/// ```
pub fn sanitize_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Location of a YouTube transcript artifact
pub fn artifact_path(dir: &Path, video_id: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_id(video_id)))
}

/// True if the file exists and is not empty
pub fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
