//! Transcript failure descriptions
//!
//! A failed fetch is still recorded in the store, as one human-readable
//! line in the transcript slot.

use crate::storage::{sanitize_field, TranscriptRef, BLOCKED_PREFIX, NO_TRANSCRIPT_PREFIX};
use crate::tool::last_line;
use std::fmt;

/// Method tag used when the platform refused automated access
pub const BLOCKED_METHOD: &str = "blocked";

/// Detail recorded when the diagnostic output was empty
pub const UNKNOWN_DETAIL: &str = "unknown error";

/// Why a transcript could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFailure {
    /// Which acquisition method failed (`yt_dlp`, `blocked`, ...)
    pub method: String,
    /// Raw diagnostic output; only its last line is ever recorded
    pub detail: String,
}

impl TranscriptFailure {
    pub fn new(method: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            detail: detail.into(),
        }
    }

    pub fn blocked(detail: impl Into<String>) -> Self {
        Self::new(BLOCKED_METHOD, detail)
    }

    pub fn is_blocked(&self) -> bool {
        self.method == BLOCKED_METHOD
    }

    /// Store-safe description of the failure
    pub fn message(&self) -> String {
        let mut detail = sanitize_field(last_line(&self.detail));
        if detail.is_empty() {
            detail = UNKNOWN_DETAIL.to_string();
        }
        if self.is_blocked() {
            format!("{} ({})", BLOCKED_PREFIX, detail)
        } else {
            format!(
                "{} ({} method: {})",
                NO_TRANSCRIPT_PREFIX,
                title_case_method(&self.method),
                detail
            )
        }
    }
}

impl fmt::Display for TranscriptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<&TranscriptFailure> for TranscriptRef {
    fn from(failure: &TranscriptFailure) -> Self {
        TranscriptRef::Failure(failure.message())
    }
}

/// Formats a failure for the transcript slot
///
/// # Example
///
/// ```
/// use ref_cli::transcript::{format_transcript_failure, TranscriptFailure};
///
/// let failure = TranscriptFailure::new("yt_dlp", "noise\nDetailed failure message");
/// assert_eq!(
///     format_transcript_failure(&failure),
///     "No transcript available (Yt Dlp method: Detailed failure message)"
/// );
/// ```
pub fn format_transcript_failure(failure: &TranscriptFailure) -> String {
    failure.message()
}

/// `yt_dlp` → `Yt Dlp`
fn title_case_method(method: &str) -> String {
    method
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
