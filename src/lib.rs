//! ref-cli: fast command-line recording of URL references
//!
//! This crate resolves and normalizes URLs, extracts page titles or video
//! metadata, fetches transcripts for YouTube and Rumble videos, and records
//! everything in an append-only, pipe-delimited reference file.

pub mod config;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod storage;
pub mod tool;
pub mod transcript;
pub mod url;

use thiserror::Error;

/// Main error type for ref-cli operations
#[derive(Debug, Error)]
pub enum RefError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Unsupported URL: {0}")]
    Unsupported(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(#[from] platform::MetadataError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RefError {
    /// Returns true if the error must stop the whole invocation
    ///
    /// Store failures are fatal; everything else only aborts the URL that
    /// produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Config(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write default config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Home directory could not be determined")]
    NoHomeDir,
}

/// Result type alias for ref-cli operations
pub type Result<T> = std::result::Result<T, RefError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{process_url, ProcessOutcome, RefContext};
pub use platform::Platform;
pub use storage::{EntryKind, ReferenceEntry, TranscriptRef};
pub use crate::url::{normalize_url, Normalizer};
