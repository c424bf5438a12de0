//! Storage module for persisting references
//!
//! This module handles the append-only reference file, including:
//! - The line grammar and entry model
//! - Deduplication by normalized URL
//! - Attaching transcripts to existing entries
//! - Integrity checks, search and backups

mod flatfile;
mod schema;
mod traits;

pub use flatfile::FlatFileStore;
pub use schema::{
    is_well_formed, sanitize_field, url_slot, EntryKind, ReferenceEntry, StoredLine,
    TranscriptRef, BLOCKED_PREFIX, EXPECTED_SHAPE, LEGACY_HEADER, NO_TRANSCRIPT_PREFIX,
    PENDING_SENTINEL, TIMESTAMP_FORMAT,
};
pub use traits::{ReferenceStore, StorageError, StorageResult};

use std::fmt;
use std::str::FromStr;

/// Result of [`ReferenceStore::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No entry existed; a new line was appended
    Appended,
    /// An existing line was rewritten
    Updated,
    /// An existing line already held everything
    Unchanged,
}

/// Result of [`ReferenceStore::update_transcript`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptUpdate {
    /// The transcript slot was filled or upgraded
    Attached,
    /// The slot already held a transcript reference that must not be replaced
    AlreadyPresent,
    /// No entry with that URL exists
    NoEntry,
}

/// A line that does not match the store grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub file: String,
    pub line_number: usize,
    pub content: String,
    pub expected: &'static str,
}

/// Field a search is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Date,
    Url,
    Title,
    Uploader,
    /// The category field (`YouTube` / `General`)
    Source,
}

impl SearchField {
    pub const ALL: [SearchField; 5] = [
        SearchField::Url,
        SearchField::Title,
        SearchField::Date,
        SearchField::Source,
        SearchField::Uploader,
    ];

    /// Index of the field within a stored line
    pub fn column(&self) -> usize {
        match self {
            Self::Date => 0,
            Self::Url => 1,
            Self::Title => 2,
            Self::Uploader => 3,
            Self::Source => 4,
        }
    }

    /// Label printed as the hit reason
    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Url => "Url",
            Self::Title => "Title",
            Self::Uploader => "Uploader",
            Self::Source => "Source",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "url" => Ok(Self::Url),
            "title" => Ok(Self::Title),
            "uploader" => Ok(Self::Uploader),
            "source" => Ok(Self::Source),
            other => Err(format!(
                "unknown search field '{}' (expected date, url, title, uploader or source)",
                other
            )),
        }
    }
}

/// A stored line matched by a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub line_number: usize,
    pub line: String,
    pub reasons: Vec<SearchField>,
}
