//! External tool invocation
//!
//! Both the page dumper and the subtitle downloader are separate programs.
//! They run under a timeout with `kill_on_drop`, so dropping the pending
//! future on timeout also kills the child.

use std::ffi::OsStr;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Ways an external tool invocation can fail before producing output
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} is not installed or not on PATH")]
    NotFound(String),

    #[error("{program} timed out after {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

/// Runs a program to completion and captures stdout and stderr
///
/// A non-zero exit is not an error here; callers inspect `Output::status`.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true);

    tracing::trace!("Running {} with a {:?} timeout", program, timeout);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ToolError::NotFound(program.to_string()))
        }
        Ok(Err(e)) => Err(ToolError::Io {
            program: program.to_string(),
            source: e,
        }),
        Err(_) => Err(ToolError::Timeout {
            program: program.to_string(),
            timeout,
        }),
    }
}

/// Last non-empty line of a tool's stderr, or an empty string
pub fn last_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("")
}
