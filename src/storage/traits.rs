//! Storage traits and error types
//!
//! This module defines the trait interface for reference stores and the
//! associated error type.

use crate::storage::{
    IntegrityViolation, ReferenceEntry, SearchField, SearchHit, TranscriptRef, TranscriptUpdate,
    WriteOutcome,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for reference store implementations
///
/// URLs passed in are compared by their normalized form, so callers may hand
/// over raw or already-normalized URLs.
pub trait ReferenceStore {
    /// Location of the backing file
    fn path(&self) -> &Path;

    /// True iff some stored entry has the same normalized URL
    fn exists(&self, url: &str) -> StorageResult<bool>;

    /// First well-formed entry with the same normalized URL
    fn find(&self, url: &str) -> StorageResult<Option<ReferenceEntry>>;

    /// True iff the entry exists and its transcript slot holds a path or failure
    fn has_transcript(&self, url: &str) -> StorageResult<bool> {
        Ok(self
            .find(url)?
            .and_then(|entry| entry.transcript)
            .map(|t| !t.is_pending())
            .unwrap_or(false))
    }

    /// Appends one line and forces it to disk before returning
    fn append(&mut self, entry: &ReferenceEntry) -> StorageResult<()>;

    /// Updates the matching entry in place, or appends the entry if absent
    ///
    /// With `rewrite_metadata` the stored title, source and kind are replaced;
    /// the transcript slot always follows [`TranscriptRef::merge`].
    fn upsert(&mut self, entry: &ReferenceEntry, rewrite_metadata: bool)
        -> StorageResult<WriteOutcome>;

    /// Attaches a transcript reference to an existing entry
    fn update_transcript(
        &mut self,
        url: &str,
        transcript: &TranscriptRef,
    ) -> StorageResult<TranscriptUpdate>;

    /// Reports every line that does not match the store grammar
    fn check_integrity(&self) -> StorageResult<Vec<IntegrityViolation>>;

    /// Case-insensitive substring search restricted to one field
    fn search(&self, term: &str, field: SearchField) -> StorageResult<Vec<SearchHit>>;

    /// Searches every field and merges hits per line
    fn search_all(&self, term: &str) -> StorageResult<Vec<SearchHit>> {
        let mut merged: Vec<SearchHit> = Vec::new();
        for field in SearchField::ALL {
            for hit in self.search(term, field)? {
                match merged.iter_mut().find(|h| h.line_number == hit.line_number) {
                    Some(existing) => {
                        for reason in hit.reasons {
                            if !existing.reasons.contains(&reason) {
                                existing.reasons.push(reason);
                            }
                        }
                    }
                    None => merged.push(hit),
                }
            }
        }
        merged.sort_by_key(|h| h.line_number);
        Ok(merged)
    }

    /// Copies the store to a timestamped sibling file
    fn backup(&self) -> StorageResult<PathBuf>;
}
