//! Validation of transcript artifacts already on disk

use crate::transcript::artifact::TranscriptArtifact;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Why an artifact failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    /// Not valid JSON
    Json,
    /// Valid JSON with missing, mistyped or empty fields
    Structure,
    /// The file could not be read
    File,
}

impl ProblemKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Structure => "structure",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One artifact that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactProblem {
    pub path: PathBuf,
    pub kind: ProblemKind,
    pub errors: Vec<String>,
}

/// Outcome of checking a transcript directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactReport {
    pub total: usize,
    pub valid: usize,
    pub problems: Vec<ArtifactProblem>,
}

impl ArtifactReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Checks every `*.json` artifact directly inside `dir`
///
/// Each file must parse into a [`TranscriptArtifact`] (all keys present,
/// non-negative integer duration) with a non-empty transcript. Files are
/// visited in name order. Problems are logged as warnings and returned.
///
/// # Errors
///
/// Fails only if `dir` itself cannot be listed.
pub fn check_artifacts(dir: &Path) -> io::Result<ArtifactReport> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut report = ArtifactReport {
        total: paths.len(),
        ..ArtifactReport::default()
    };

    for path in paths {
        tracing::debug!("Checking transcript {}", path.display());
        let problem = match TranscriptArtifact::read_from(&path) {
            Ok(artifact) => {
                let errors = artifact.validate();
                if errors.is_empty() {
                    report.valid += 1;
                    continue;
                }
                ArtifactProblem {
                    path,
                    kind: ProblemKind::Structure,
                    errors,
                }
            }
            Err(e) => ArtifactProblem {
                kind: classify_read_error(&e),
                errors: vec![e.to_string()],
                path,
            },
        };

        tracing::warn!(
            "Malformed transcript {} ({}): {}",
            problem.path.display(),
            problem.kind,
            problem.errors.join("; ")
        );
        report.problems.push(problem);
    }

    Ok(report)
}

fn classify_read_error(err: &io::Error) -> ProblemKind {
    let json = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<serde_json::Error>());
    match json.map(|e| e.classify()) {
        Some(serde_json::error::Category::Data) => ProblemKind::Structure,
        Some(serde_json::error::Category::Syntax | serde_json::error::Category::Eof) => {
            ProblemKind::Json
        }
        _ => ProblemKind::File,
    }
}
