//! Line grammar of the reference store
//!
//! One record per line:
//!
//! ```text
//! <YYYY-MM-DDTHH:MM:SS>|[<url>]|(<title>)|<uploader-or-source>|<YouTube|General>[|<transcript-ref>]
//! ```
//!
//! The optional sixth field is a transcript artifact path, a failure
//! description, or the literal `None` while a fetch is pending.

use chrono::{Local, NaiveDateTime, Timelike};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Timestamp format of the first field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Literal stored while a transcript is pending
pub const PENDING_SENTINEL: &str = "None";

/// Prefix of a generic transcript failure description
pub const NO_TRANSCRIPT_PREFIX: &str = "No transcript available";

/// Prefix of a "platform refused automated access" failure description
pub const BLOCKED_PREFIX: &str = "Transcript blocked by YouTube";

/// Header written by the legacy merge tool; tolerated on the first line
pub const LEGACY_HEADER: &str = "Date|URL|Title|Source|Type";

/// Human-readable shape reported by the integrity check
pub const EXPECTED_SHAPE: &str =
    "YYYY-MM-DDTHH:MM:SS|[URL]|(Title)|Source|YouTube or General[|transcript]";

/// Storage-level category of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    YouTube,
    General,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::General => "General",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "YouTube" => Some(Self::YouTube),
            "General" => Some(Self::General),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of the transcript slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptRef {
    /// Fetch not attempted yet (`None` on disk)
    Pending,
    /// Path to a transcript artifact
    Artifact(PathBuf),
    /// Description of why no transcript could be fetched
    Failure(String),
}

impl TranscriptRef {
    /// Interprets a stored sixth field
    ///
    /// Returns None for text that is neither the pending sentinel, a failure
    /// description, nor a path to a transcript file.
    pub fn parse(field: &str) -> Option<Self> {
        let field = field.trim();
        if field == PENDING_SENTINEL || field.is_empty() {
            Some(Self::Pending)
        } else if field.starts_with(NO_TRANSCRIPT_PREFIX) || field.starts_with(BLOCKED_PREFIX) {
            Some(Self::Failure(field.to_string()))
        } else if is_path_like(field) {
            Some(Self::Artifact(PathBuf::from(field)))
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_artifact(&self) -> bool {
        matches!(self, Self::Artifact(_))
    }

    /// Text written into the line
    pub fn to_field(&self) -> String {
        match self {
            Self::Pending => PENDING_SENTINEL.to_string(),
            Self::Artifact(path) => sanitize_field(&path.to_string_lossy()),
            Self::Failure(message) => sanitize_field(message),
        }
    }

    /// Decides what the slot should hold after `incoming` arrives
    ///
    /// Returns `None` when the slot must stay as it is. The slot never goes
    /// back to pending and an artifact path is never replaced.
    pub fn merge(current: Option<&TranscriptRef>, incoming: &TranscriptRef) -> Option<TranscriptRef> {
        match (current, incoming) {
            (None, new) => Some(new.clone()),
            (Some(_), Self::Pending) => None,
            (Some(Self::Pending), new) => Some(new.clone()),
            (Some(Self::Artifact(_)), _) => None,
            (Some(Self::Failure(_)), Self::Artifact(path)) => Some(Self::Artifact(path.clone())),
            (Some(Self::Failure(old)), Self::Failure(new)) if old != new => {
                Some(Self::Failure(new.clone()))
            }
            (Some(Self::Failure(_)), Self::Failure(_)) => None,
        }
    }
}

impl fmt::Display for TranscriptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

/// One logical record of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub timestamp: NaiveDateTime,
    pub url: String,
    pub title: String,
    pub source: String,
    pub kind: EntryKind,
    pub transcript: Option<TranscriptRef>,
}

impl ReferenceEntry {
    /// Creates an entry stamped with the current local time (second precision)
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        kind: EntryKind,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            url: url.into(),
            title: title.into(),
            source: source.into(),
            kind,
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, transcript: TranscriptRef) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Renders the entry as one store line (without the trailing newline)
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{}|[{}]|({})|{}|{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            sanitize_url(&self.url),
            sanitize_field(&self.title),
            sanitize_field(&self.source),
            self.kind
        );
        if let Some(transcript) = &self.transcript {
            line.push('|');
            line.push_str(&transcript.to_field());
        }
        line
    }

    /// Parses a well-formed line; returns None for anything else
    pub fn from_line(line: &str) -> Option<Self> {
        let stored = StoredLine::parse(line)?;
        let timestamp =
            NaiveDateTime::parse_from_str(stored.fields[0].trim(), TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            timestamp,
            url: stored.url().to_string(),
            title: stored.title().to_string(),
            source: stored.fields[3].clone(),
            kind: EntryKind::parse(&stored.fields[4])?,
            transcript: stored.transcript(),
        })
    }
}

/// A stored line split into its pipe-delimited fields
///
/// Edits go through this type so untouched fields are written back exactly
/// as they were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLine {
    fields: Vec<String>,
}

impl StoredLine {
    /// Splits a line; lines with fewer than five fields are not records
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields: Vec<String> = line.split('|').map(str::to_string).collect();
        if fields.len() < 5 {
            return None;
        }
        if fields.len() > 6 {
            // Legacy lines sometimes carried several transcript suffixes;
            // the last one is the most recent.
            let last = fields.pop().unwrap_or_default();
            fields.truncate(5);
            fields.push(last);
        }
        Some(Self { fields })
    }

    /// URL without its brackets
    pub fn url(&self) -> &str {
        strip_wrapping(&self.fields[1], '[', ']')
    }

    /// Title without its parentheses
    pub fn title(&self) -> &str {
        strip_wrapping(&self.fields[2], '(', ')')
    }

    /// Transcript slot; a malformed sixth field counts as no transcript
    pub fn transcript(&self) -> Option<TranscriptRef> {
        let field = self.fields.get(5)?;
        let parsed = TranscriptRef::parse(field);
        if parsed.is_none() {
            tracing::warn!(
                "Ignoring malformed transcript field for {}: {}",
                self.url(),
                field.trim()
            );
        }
        parsed
    }

    pub fn set_transcript(&mut self, transcript: &TranscriptRef) {
        let field = transcript.to_field();
        if self.fields.len() > 5 {
            self.fields[5] = field;
        } else {
            self.fields.push(field);
        }
    }

    /// Replaces title, source and kind; returns true if anything changed
    pub fn set_metadata(&mut self, title: &str, source: &str, kind: EntryKind) -> bool {
        let title = format!("({})", sanitize_field(title));
        let source = sanitize_field(source);
        let kind = kind.as_str().to_string();
        let changed = self.fields[2] != title || self.fields[3] != source || self.fields[4] != kind;
        self.fields[2] = title;
        self.fields[3] = source;
        self.fields[4] = kind;
        changed
    }

    pub fn render(&self) -> String {
        self.fields.join("|")
    }
}

/// Extracts the bracket-delimited URL slot from a raw line
///
/// The second field is used when it is bracketed; otherwise the first
/// bracketed run anywhere in the line. Works on malformed lines too, so
/// deduplication still sees them.
pub fn url_slot(line: &str) -> Option<&str> {
    let second = line
        .split('|')
        .nth(1)
        .map(str::trim)
        .and_then(|field| field.strip_prefix('['))
        .and_then(|field| field.strip_suffix(']'))
        .filter(|url| !url.is_empty());
    if second.is_some() {
        return second;
    }

    static SLOT: OnceLock<Regex> = OnceLock::new();
    let re = SLOT.get_or_init(|| Regex::new(r"\[([^\]]+)\]").expect("valid url slot regex"));
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns true if the line matches the canonical grammar
pub fn is_well_formed(line: &str) -> bool {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    let re = GRAMMAR.get_or_init(|| {
        Regex::new(
            r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\|\[[^|]+\]\|\([^|]*\)\|[^|]*\|(YouTube|General)(\|[^|]+)?$",
        )
        .expect("valid store grammar regex")
    });
    re.is_match(line.trim_end_matches(['\n', '\r']))
}

/// Removes characters that would break the line grammar
pub fn sanitize_field(value: &str) -> String {
    value
        .replace(['\r', '\n'], " ")
        .replace('|', "/")
        .trim()
        .to_string()
}

/// Makes a URL safe for the bracketed slot
///
/// Only `|` and line breaks are escaped. A `]` is left alone since the slot
/// is delimited by the field separators, which keeps IPv6 hosts intact.
fn sanitize_url(url: &str) -> String {
    url.trim().replace(['\r', '\n'], "").replace('|', "%7C")
}

/// Transcript files are JSON artifacts or VTT subtitles
fn is_path_like(field: &str) -> bool {
    let lower = field.to_lowercase();
    field.contains(['/', '\\']) || lower.ends_with(".json") || lower.ends_with(".vtt")
}

fn strip_wrapping(value: &str, open: char, close: char) -> &str {
    let value = value.trim();
    value
        .strip_prefix(open)
        .and_then(|v| v.strip_suffix(close))
        .unwrap_or(value)
}
