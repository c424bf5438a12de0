//! Batch and interactive processing
//!
//! URLs are handled strictly one at a time with a pause between them. In a
//! batch file, each successfully handled line is commented out so a rerun
//! only retries what is left.

use crate::output::print_outcome;
use crate::pipeline::{process_url, RefContext};
use crate::storage::StorageError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Prompt printed before every interactive read
pub const PROMPT: &str = "Enter a URL to record (or press Ctrl+C to quit): ";

/// Tally of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Lines that held a URL
    pub processed: usize,
    /// URLs handled and commented out
    pub succeeded: usize,
    /// URLs whose page could not be read (left for a retry)
    pub skipped: usize,
    /// URLs rejected or failed (left for a retry)
    pub failed: usize,
}

/// Processes every URL line of a file and comments out the handled ones
///
/// Blank lines and lines starting with `#` are kept as they are. The file
/// is rewritten once at the end, or before returning a store error.
///
/// # Errors
///
/// * `RefError::Io` - the batch file could not be read or rewritten
/// * `RefError::Storage` - the reference store failed; processing stops
pub async fn process_file(
    ctx: &mut RefContext,
    path: &Path,
    force: bool,
) -> crate::Result<BatchReport> {
    let content = std::fs::read_to_string(path)?;
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut report = BatchReport::default();

    for index in 0..lines.len() {
        let url = lines[index].trim().to_string();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }

        if report.processed > 0 && !ctx.batch_delay.is_zero() {
            tokio::time::sleep(ctx.batch_delay).await;
        }
        report.processed += 1;
        println!("\nProcessing URL {}: {}", index + 1, url);

        match process_url(ctx, &url, force).await {
            Ok(outcome) if outcome.is_success() => {
                print_outcome(&outcome);
                lines[index] = format!("# {}", lines[index]);
                report.succeeded += 1;
            }
            Ok(outcome) => {
                print_outcome(&outcome);
                report.skipped += 1;
            }
            Err(e) if e.is_fatal() => {
                tracing::error!("Stopping batch at line {}: {}", index + 1, e);
                write_lines(path, &lines)?;
                return Err(e);
            }
            Err(e) => {
                println!("Error processing URL on line {}: {}", index + 1, e);
                tracing::error!("Error processing URL '{}' on line {}: {}", url, index + 1, e);
                report.failed += 1;
            }
        }
    }

    write_lines(path, &lines)?;
    tracing::info!(
        "Batch finished: {} processed, {} succeeded, {} skipped, {} failed",
        report.processed,
        report.succeeded,
        report.skipped,
        report.failed
    );
    Ok(report)
}

fn write_lines(path: &Path, lines: &[String]) -> crate::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    for line in lines {
        writeln!(tmp, "{}", line)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Reads URLs from `input` until end of input
///
/// Returns the number of URLs handled. Per-URL errors are reported and the
/// loop continues; store errors end it.
pub async fn run_interactive<R>(ctx: &mut RefContext, input: R) -> crate::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;

    loop {
        println!("{}", PROMPT);
        let Some(line) = lines.next_line().await? else {
            println!("\nNo input received. Exiting...");
            break;
        };

        let url = line.trim();
        if url.is_empty() {
            println!("Empty URL. Please enter a valid URL.");
            continue;
        }

        match process_url(ctx, url, false).await {
            Ok(outcome) => {
                print_outcome(&outcome);
                handled += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                println!("An error occurred: {}", e);
                tracing::error!("An error occurred processing {}: {}", url, e);
            }
        }

        if !ctx.batch_delay.is_zero() {
            tokio::time::sleep(ctx.batch_delay).await;
        }
    }

    Ok(handled)
}
