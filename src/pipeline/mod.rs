//! URL processing pipeline
//!
//! This module handles:
//! - Wiring the resolver, extractors, fetchers and store together
//! - Recording a single URL
//! - Refreshing the transcript of a recorded video
//! - Batch files and the interactive prompt

mod batch;
mod context;
mod dispatcher;

pub use batch::{process_file, run_interactive, BatchReport, PROMPT};
pub use context::RefContext;
pub use dispatcher::{
    process_url, refresh_transcript, ProcessOutcome, RefreshOutcome,
    GENERAL_SOURCE, PDF_SOURCE,
};
