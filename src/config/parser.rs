use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Name of the reference store inside the references directory
pub const REFERENCES_FILE: &str = "references.md";

/// Environment variable holding the YouTube Data API key
pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ref_cli::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Store lives in: {}", config.paths.references);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration, writing the defaults first if the file is missing
pub fn load_or_create_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&Config::default())?;
        std::fs::write(path, rendered)?;
        tracing::info!("Wrote default configuration to {}", path.display());
    }
    load_config(path)
}

/// Returns `~/.config/ref/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".config").join("ref").join("config.toml"))
}

/// Returns `~/.env`, the dotenv file read at startup
pub fn default_env_path() -> Result<PathBuf, ConfigError> {
    Ok(dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(".env"))
}

/// Sets `key=value` in a dotenv file
///
/// An existing assignment of `key` is replaced in place; other lines are
/// kept. The file is created if missing.
pub fn set_env_var(path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.contains(['\n', '\r']) {
        return Err(ConfigError::Validation(format!(
            "{} must be a single non-empty line",
            key
        )));
    }

    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let assignment = format!("{}={}", key, value);
    let mut replaced = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            let name = line.trim_start().trim_start_matches("export ");
            if !replaced && name.split('=').next().map(str::trim) == Some(key) {
                replaced = true;
                assignment.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(assignment);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    std::fs::write(path, rendered)?;
    Ok(())
}

/// Expands a leading `~` to the user's home directory
pub fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(ConfigError::NoHomeDir);
    }
    match raw.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(rest)),
        None => Ok(PathBuf::from(raw)),
    }
}

impl Config {
    /// Full path of `references.md`
    pub fn references_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(expand_path(&self.paths.references)?.join(REFERENCES_FILE))
    }

    pub fn transcripts_dir(&self) -> Result<PathBuf, ConfigError> {
        expand_path(&self.paths.transcripts)
    }

    pub fn logs_dir(&self) -> Result<PathBuf, ConfigError> {
        expand_path(&self.paths.logs)
    }
}
