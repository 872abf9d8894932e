//! One-call build entry point: XML in, database file out.

use std::io::BufRead;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::builder::{BuildOptions, BuildProgress, InfoBuilder};
use crate::header::TableCounts;
use crate::Error;

/// Prefix of messages for XML that could not be parsed.
pub const PARSE_ERROR_PREFIX: &str = "Error parsing XML from -listxml:";

/// What a successful build produced.
#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    pub counts: TableCounts,
    /// Bytes written.
    pub size: u64,
    /// Parent references that named no machine.
    pub dangling_references: usize,
    pub elapsed: Duration,
}

/// Result of [`build_info_file`].
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Success(BuildSummary),
    /// The abort flag was raised. Nothing was written.
    Cancelled,
    /// The build failed. Nothing was written.
    Failed(String),
}

impl BuildOutcome {
    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            BuildOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Build a database from `-listxml` output and write it to `output`.
///
/// Every failure is folded into the returned outcome; cancellation is kept
/// apart from failures so callers do not report it as corruption.
pub fn build_info_file<R, F>(input: R, output: &Path, options: &BuildOptions, progress: F) -> BuildOutcome
where
    R: BufRead,
    F: FnMut(&BuildProgress<'_>),
{
    let started = Instant::now();
    let mut builder = InfoBuilder::new();

    let result = builder
        .process_xml(input, options, progress)
        .and_then(|()| builder.write_to_file(output))
        .and_then(|()| builder.counts());

    match result {
        Ok(counts) => {
            let summary = BuildSummary {
                counts,
                size: std::fs::metadata(output).map(|m| m.len()).unwrap_or_default(),
                dangling_references: builder.resolve_report().dangling,
                elapsed: started.elapsed(),
            };
            tracing::info!(
                path = %output.display(),
                machines = { counts.machines },
                bytes = summary.size,
                elapsed = ?summary.elapsed,
                "built info database"
            );
            BuildOutcome::Success(summary)
        }
        Err(Error::Cancelled) => {
            tracing::info!("info database build cancelled");
            BuildOutcome::Cancelled
        }
        Err(e) => {
            let message = match e {
                Error::Xml { message } => format!("{PARSE_ERROR_PREFIX} {message}"),
                other => other.to_string(),
            };
            tracing::error!("{message}");
            BuildOutcome::Failed(message)
        }
    }
}
