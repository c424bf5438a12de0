//! Terminal output for the CLI modes
//!
//! Each report has a `write_*` function taking any writer (used by tests)
//! and a `print_*` wrapper for stdout.

use crate::pipeline::ProcessOutcome;
use crate::storage::{IntegrityViolation, SearchHit};
use crate::transcript::ArtifactReport;
use std::io::{self, Write};

/// Writes search hits, each followed by its hit reasons
///
/// ```text
/// 2024-01-01T00:00:00|[https://example.com]|(Example)|General|General
/// -Hit Type: Title
/// ```
pub fn write_search_hits<W: Write>(out: &mut W, hits: &[SearchHit]) -> io::Result<()> {
    if hits.is_empty() {
        writeln!(out, "No matching references found.")?;
        return Ok(());
    }
    for hit in hits {
        writeln!(out, "{}", hit.line.trim())?;
        for reason in &hit.reasons {
            writeln!(out, "-Hit Type: {}", reason)?;
        }
    }
    Ok(())
}

pub fn print_search_hits(hits: &[SearchHit]) -> io::Result<()> {
    write_search_hits(&mut io::stdout().lock(), hits)
}

/// Writes the result of an integrity check
pub fn write_integrity_report<W: Write>(
    out: &mut W,
    violations: &[IntegrityViolation],
) -> io::Result<()> {
    if violations.is_empty() {
        writeln!(out, "Integrity check passed. Reference file is formatted correctly.")?;
        return Ok(());
    }

    writeln!(out, "Integrity check failed:")?;
    for violation in violations {
        writeln!(
            out,
            "{} line {}: {}\nExpected: {}",
            violation.file, violation.line_number, violation.content, violation.expected
        )?;
    }
    Ok(())
}

pub fn print_integrity_report(violations: &[IntegrityViolation]) -> io::Result<()> {
    write_integrity_report(&mut io::stdout().lock(), violations)
}

/// Writes the summary of a transcript artifact check
pub fn write_artifact_report<W: Write>(out: &mut W, report: &ArtifactReport) -> io::Result<()> {
    writeln!(out, "Total files checked: {}", report.total)?;
    writeln!(out, "Valid files: {}", report.valid)?;
    writeln!(out, "Invalid files: {}", report.problems.len())?;
    if report.is_clean() {
        return Ok(());
    }

    writeln!(out, "\nProblematic files:")?;
    for problem in &report.problems {
        let name = problem
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| problem.path.display().to_string());
        writeln!(out, "  {} ({})", name, problem.kind)?;
        for error in &problem.errors {
            writeln!(out, "    - {}", error)?;
        }
    }
    Ok(())
}

pub fn print_artifact_report(report: &ArtifactReport) -> io::Result<()> {
    write_artifact_report(&mut io::stdout().lock(), report)
}

/// Prints what happened to one URL
pub fn print_outcome(outcome: &ProcessOutcome) {
    println!("{}", outcome);
}
