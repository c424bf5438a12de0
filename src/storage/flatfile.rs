//! Flat-file reference store
//!
//! This module provides the pipe-delimited `references.md` implementation of
//! the ReferenceStore trait.

use crate::storage::schema::{
    is_well_formed, url_slot, ReferenceEntry, StoredLine, TranscriptRef, EXPECTED_SHAPE,
    LEGACY_HEADER,
};
use crate::storage::traits::{ReferenceStore, StorageError, StorageResult};
use crate::storage::{IntegrityViolation, SearchField, SearchHit, TranscriptUpdate, WriteOutcome};
use crate::url::Normalizer;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Reference store backed by one line-oriented text file
pub struct FlatFileStore {
    path: PathBuf,
    normalizer: Normalizer,
}

impl FlatFileStore {
    /// Opens the store, creating the file and its directory if needed
    ///
    /// # Arguments
    ///
    /// * `path` - Path to `references.md`
    /// * `normalizer` - Normalizer used for URL comparisons
    pub fn open(path: &Path, normalizer: Normalizer) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            normalizer,
        })
    }

    fn read_lines(&self) -> StorageResult<Vec<String>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Runs a read-modify-write transaction over the whole file
    ///
    /// The closure receives a snapshot of every line and returns its result
    /// plus a dirty flag. Dirty snapshots are written to a temporary file in
    /// the same directory, synced, and renamed over the store, so an
    /// interruption leaves either the old or the new file.
    fn transact<T, F>(&self, apply: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Vec<String>) -> (T, bool),
    {
        let mut lines = self.read_lines()?;
        let (value, dirty) = apply(&mut lines);
        if dirty {
            self.rewrite(&lines)?;
        }
        Ok(value)
    }

    fn rewrite(&self, lines: &[String]) -> StorageResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
        for line in lines {
            writeln!(tmp, "{}", line).map_err(|e| StorageError::io(tmp.path(), e))?;
        }
        tmp.flush().map_err(|e| StorageError::io(tmp.path(), e))?;

        if let Ok(metadata) = std::fs::metadata(&self.path) {
            // Keep the store's permissions instead of the temp file's 0600
            let _ = tmp.as_file().set_permissions(metadata.permissions());
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(tmp.path(), e))?;

        tmp.persist(&self.path).map_err(|e| StorageError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Index of the first parseable line whose URL matches
    fn position_of(&self, lines: &[String], url: &str) -> Option<(usize, StoredLine)> {
        let wanted = self.normalizer.normalize(url);
        lines.iter().enumerate().find_map(|(index, line)| {
            StoredLine::parse(line)
                .filter(|stored| self.normalizer.normalize(stored.url()) == wanted)
                .map(|stored| (index, stored))
        })
    }
}

impl ReferenceStore for FlatFileStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self, url: &str) -> StorageResult<bool> {
        let wanted = self.normalizer.normalize(url);
        Ok(self.read_lines()?.iter().any(|line| {
            url_slot(line)
                .map(|slot| self.normalizer.normalize(slot) == wanted)
                .unwrap_or(false)
        }))
    }

    fn find(&self, url: &str) -> StorageResult<Option<ReferenceEntry>> {
        let wanted = self.normalizer.normalize(url);
        Ok(self
            .read_lines()?
            .iter()
            .filter_map(|line| ReferenceEntry::from_line(line))
            .find(|entry| self.normalizer.normalize(&entry.url) == wanted))
    }

    fn append(&mut self, entry: &ReferenceEntry) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;

        writeln!(file, "{}", entry.to_line()).map_err(|e| StorageError::io(&self.path, e))?;
        file.flush().map_err(|e| StorageError::io(&self.path, e))?;
        file.sync_all()
            .map_err(|e| StorageError::io(&self.path, e))?;

        tracing::debug!("Appended reference for {}", entry.url);
        Ok(())
    }

    fn upsert(
        &mut self,
        entry: &ReferenceEntry,
        rewrite_metadata: bool,
    ) -> StorageResult<WriteOutcome> {
        let outcome = self.transact(|lines| match self.position_of(lines, &entry.url) {
            None => (None, false),
            Some((index, mut stored)) => {
                let mut changed = false;
                if rewrite_metadata {
                    changed |= stored.set_metadata(&entry.title, &entry.source, entry.kind);
                }
                if let Some(incoming) = &entry.transcript {
                    let current = stored.transcript();
                    if let Some(next) = TranscriptRef::merge(current.as_ref(), incoming) {
                        stored.set_transcript(&next);
                        changed = true;
                    }
                }
                if changed {
                    lines[index] = stored.render();
                    (Some(WriteOutcome::Updated), true)
                } else {
                    (Some(WriteOutcome::Unchanged), false)
                }
            }
        })?;

        match outcome {
            Some(outcome) => Ok(outcome),
            None => {
                self.append(entry)?;
                Ok(WriteOutcome::Appended)
            }
        }
    }

    fn update_transcript(
        &mut self,
        url: &str,
        transcript: &TranscriptRef,
    ) -> StorageResult<TranscriptUpdate> {
        self.transact(|lines| match self.position_of(lines, url) {
            None => (TranscriptUpdate::NoEntry, false),
            Some((index, mut stored)) => {
                let current = stored.transcript();
                match TranscriptRef::merge(current.as_ref(), transcript) {
                    Some(next) => {
                        stored.set_transcript(&next);
                        lines[index] = stored.render();
                        (TranscriptUpdate::Attached, true)
                    }
                    None => (TranscriptUpdate::AlreadyPresent, false),
                }
            }
        })
    }

    fn check_integrity(&self) -> StorageResult<Vec<IntegrityViolation>> {
        let file = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self
            .read_lines()?
            .iter()
            .enumerate()
            .filter(|(index, line)| {
                !(line.trim().is_empty() || (*index == 0 && line.trim() == LEGACY_HEADER))
            })
            .filter(|(_, line)| !is_well_formed(line))
            .map(|(index, line)| IntegrityViolation {
                file: file.clone(),
                line_number: index + 1,
                content: line.trim().to_string(),
                expected: EXPECTED_SHAPE,
            })
            .collect())
    }

    fn search(&self, term: &str, field: SearchField) -> StorageResult<Vec<SearchHit>> {
        let needle = term.to_lowercase();
        let mut hits = Vec::new();

        for (index, line) in self.read_lines()?.into_iter().enumerate() {
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() < 5 {
                tracing::warn!(
                    "Line {} does not have the expected number of fields: {}",
                    index + 1,
                    line.trim()
                );
                continue;
            }
            if fields[field.column()].to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    line_number: index + 1,
                    line: line.clone(),
                    reasons: vec![field],
                });
            }
        }

        Ok(hits)
    }

    fn backup(&self) -> StorageResult<PathBuf> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "references.md".to_string());
        let stamp = Local::now().format("%Y%m%dT%H%M%S");
        let target = self
            .path
            .with_file_name(format!("{}_{}", stamp, name));

        std::fs::copy(&self.path, &target).map_err(|e| StorageError::io(&target, e))?;
        tracing::info!("Backup created: {}", target.display());
        Ok(target)
    }
}
