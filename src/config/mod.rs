//! Configuration module for ref-cli
//!
//! This module handles loading, parsing, and validating the TOML
//! configuration file (`~/.config/ref/config.toml` by default).
//!
//! # Example
//!
//! ```no_run
//! use ref_cli::config::{default_config_path, load_or_create_config};
//!
//! let path = default_config_path().unwrap();
//! let config = load_or_create_config(&path).unwrap();
//! println!("Transcripts go to: {}", config.paths.transcripts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, PathsConfig, ResolverConfig, ToolsConfig, YouTubeConfig,
    DEFAULT_REMOVABLE_KEYS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    default_config_path, default_env_path, expand_path, load_config, load_or_create_config,
    set_env_var, API_KEY_VAR, REFERENCES_FILE,
};
