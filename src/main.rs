//! ref main entry point
//!
//! This is the command-line interface for recording URL references.

use anyhow::{bail, Context};
use clap::Parser;
use ref_cli::config::{
    default_config_path, default_env_path, load_or_create_config, set_env_var, Config,
    API_KEY_VAR,
};
use ref_cli::output::{
    print_artifact_report, print_integrity_report, print_outcome, print_search_hits,
};
use ref_cli::pipeline::{process_file, process_url, refresh_transcript, run_interactive};
use ref_cli::storage::{FlatFileStore, ReferenceStore, SearchField};
use ref_cli::transcript::check_artifacts;
use ref_cli::url::Normalizer;
use ref_cli::RefContext;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ref: record URL references
///
/// Resolves redirects, strips tracking parameters, looks up page titles or
/// video metadata, fetches YouTube and Rumble transcripts, and appends one
/// line per reference to `references.md`. With no URL and no mode, URLs
/// are read from stdin.
#[derive(Parser, Debug)]
#[command(name = "ref")]
#[command(version)]
#[command(about = "Record URL references with titles and transcripts", long_about = None)]
struct Cli {
    /// URL to record (or to refresh with --transcript)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Record even if the URL is already stored
    #[arg(short, long)]
    force: bool,

    /// Process every URL in a file, commenting out handled lines
    #[arg(long, value_name = "PATH", conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Fetch the transcript for an already recorded video
    #[arg(long, requires = "url")]
    transcript: bool,

    /// Check that every stored line is well formed
    #[arg(long)]
    integrity: bool,

    /// Validate the saved transcript JSON files
    #[arg(long)]
    check_transcripts: bool,

    /// Prompt for a YouTube Data API key and save it to ~/.env
    #[arg(long)]
    set_api_key: bool,

    /// Search all fields
    #[arg(long, value_name = "TERM")]
    search: Option<String>,

    /// Search URLs
    #[arg(long, value_name = "TERM")]
    search_url: Option<String>,

    /// Search titles
    #[arg(long, value_name = "TERM")]
    search_title: Option<String>,

    /// Search dates
    #[arg(long, value_name = "TERM")]
    search_date: Option<String>,

    /// Search the entry type (YouTube or General)
    #[arg(long, value_name = "TERM")]
    search_source: Option<String>,

    /// Search uploaders and source labels
    #[arg(long, value_name = "TERM")]
    search_uploader: Option<String>,

    /// Copy the reference file to a timestamped backup
    #[arg(short, long)]
    backup: bool,

    /// Open the reference file in $EDITOR
    #[arg(short, long)]
    edit: bool,

    /// Path to TOML configuration file (default: ~/.config/ref/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// The single-field search requested on the command line, if any
    fn field_search(&self) -> Option<(&str, SearchField)> {
        [
            (&self.search_url, SearchField::Url),
            (&self.search_title, SearchField::Title),
            (&self.search_date, SearchField::Date),
            (&self.search_source, SearchField::Source),
            (&self.search_uploader, SearchField::Uploader),
        ]
        .into_iter()
        .find_map(|(term, field)| term.as_deref().map(|t| (t, field)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(home) = dirs::home_dir() {
        // A missing ~/.env is fine; the key may come from the environment
        dotenv::from_path(home.join(".env")).ok();
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = load_or_create_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let logs_dir = config.logs_dir()?;
    setup_logging(cli.verbose, cli.quiet, &logs_dir)?;
    tracing::debug!("Configuration loaded from {}", config_path.display());

    if cli.set_api_key {
        handle_set_api_key()
    } else if cli.integrity {
        handle_integrity(&config)
    } else if cli.check_transcripts {
        handle_check_transcripts(&config)
    } else if cli.backup {
        handle_backup(&config)
    } else if let Some(term) = &cli.search {
        handle_search(&config, term, None)
    } else if let Some((term, field)) = cli.field_search() {
        handle_search(&config, term, Some(field))
    } else if cli.edit {
        handle_edit(&config)
    } else if cli.transcript {
        let url = cli.url.as_deref().context("--transcript requires a URL")?;
        handle_transcript(&config, url).await
    } else if let Some(path) = &cli.file {
        handle_file(&config, path, cli.force).await
    } else if let Some(url) = &cli.url {
        handle_url(&config, url, cli.force).await
    } else {
        handle_interactive(&config).await
    }
}

/// Sets up the logging/tracing subscriber
///
/// Terminal output follows `-v`/`-q`. Everything at debug and above also
/// goes to `ref.log`, and errors go to `ref_errors.log`.
fn setup_logging(verbose: u8, quiet: bool, logs_dir: &Path) -> anyhow::Result<()> {
    let stderr_filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ref_cli=warn,ref=warn,error"),
            1 => EnvFilter::new("ref_cli=info,ref=info,warn"),
            2 => EnvFilter::new("ref_cli=debug,ref=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;
    let open_log = |name: &str| {
        let path = logs_dir.join(name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))
    };
    let main_log = Arc::new(open_log("ref.log")?);
    let error_log = Arc::new(open_log("ref_errors.log")?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_filter(stderr_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(main_log)
                .with_ansi(false)
                .with_filter(EnvFilter::new("ref_cli=debug,ref=debug,info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(error_log)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR),
        )
        .init();

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<FlatFileStore> {
    let normalizer = Normalizer::new(&config.removable_keys);
    Ok(FlatFileStore::open(&config.references_file()?, normalizer)?)
}

/// Handles --integrity
fn handle_integrity(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let violations = store.check_integrity()?;
    print_integrity_report(&violations)?;
    if !violations.is_empty() {
        tracing::warn!("{} malformed lines in {}", violations.len(), store.path().display());
    }
    Ok(())
}

/// Handles --check-transcripts
fn handle_check_transcripts(config: &Config) -> anyhow::Result<()> {
    let dir = config.transcripts_dir()?;
    if !dir.is_dir() {
        bail!("Transcripts directory does not exist: {}", dir.display());
    }

    let report = check_artifacts(&dir)
        .with_context(|| format!("Failed to list transcripts in {}", dir.display()))?;
    print_artifact_report(&report)?;
    if !report.is_clean() {
        bail!(
            "{} of {} transcript files are malformed",
            report.problems.len(),
            report.total
        );
    }
    Ok(())
}

/// Handles --set-api-key
fn handle_set_api_key() -> anyhow::Result<()> {
    print!("Please enter your {}: ", API_KEY_VAR);
    std::io::stdout().flush()?;

    let mut key = String::new();
    std::io::stdin()
        .read_line(&mut key)
        .context("Failed to read the API key")?;

    let path = default_env_path()?;
    set_env_var(&path, API_KEY_VAR, &key)?;
    println!("{} saved to {}", API_KEY_VAR, path.display());
    Ok(())
}

/// Handles --backup
fn handle_backup(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let target = store.backup()?;
    println!("Backup created: {}", target.display());
    Ok(())
}

/// Handles --search and the --search-<field> variants
fn handle_search(config: &Config, term: &str, field: Option<SearchField>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let hits = match field {
        Some(field) => store.search(term, field)?,
        None => store.search_all(term)?,
    };
    print_search_hits(&hits)?;
    Ok(())
}

/// Handles --edit
fn handle_edit(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string());

    let status = std::process::Command::new(&editor)
        .arg(store.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", editor))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", editor, status);
    }
    Ok(())
}

/// Handles --transcript <URL>
async fn handle_transcript(config: &Config, url: &str) -> anyhow::Result<()> {
    let mut ctx = RefContext::from_config(config)?;
    let outcome = refresh_transcript(&mut ctx, url).await?;
    println!("{}", outcome);
    Ok(())
}

/// Handles --file <PATH>
async fn handle_file(config: &Config, path: &Path, force: bool) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("File '{}' not found", path.display());
    }
    let mut ctx = RefContext::from_config(config)?;
    let report = process_file(&mut ctx, path, force).await?;
    println!(
        "\nFinished processing all URLs from file: {} succeeded, {} skipped, {} failed.",
        report.succeeded, report.skipped, report.failed
    );
    Ok(())
}

/// Handles a single URL argument
async fn handle_url(config: &Config, url: &str, force: bool) -> anyhow::Result<()> {
    let mut ctx = RefContext::from_config(config)?;
    match process_url(&mut ctx, url, force).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to record {}: {}", url, e);
            Err(e.into())
        }
    }
}

/// Handles the stdin prompt loop
async fn handle_interactive(config: &Config) -> anyhow::Result<()> {
    let mut ctx = RefContext::from_config(config)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let handled = run_interactive(&mut ctx, stdin).await?;
    tracing::info!("Interactive session recorded {} URLs", handled);
    Ok(())
}
