//! Error types for the bootstrap pipeline.
//!
//! Every failure aborts the run. Variants carry the paths, records and exit
//! codes involved so the CLI can print a diagnostic without re-deriving them.

use crate::helpers::internal::hash::IntegrityRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("hash/size mismatch for {}\n  exp: {expected}\n  act: {actual}", path.display())]
    IntegrityMismatch {
        path: PathBuf,
        expected: IntegrityRecord,
        actual: IntegrityRecord,
    },

    #[error("download failed: {url}: {reason}")]
    DownloadFailure { url: String, reason: String },

    #[error("extraction failed for {}: {reason}{}", archive.display(), render_command(command.as_deref(), *exit_code, output))]
    ExtractionFailure {
        archive: PathBuf,
        reason: String,
        command: Option<String>,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("precondition failed ({check}): {detail}")]
    PreconditionViolation { check: String, detail: String },

    #[error("dependency order violation: {detail}")]
    SpecOrderViolation { detail: String },

    #[error("invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("stage '{stage}' failed{}", render_command(Some(command.as_str()), Some(*exit_code), output))]
    StageFailure {
        stage: String,
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "cache {} is in use by another locally process. If this is incorrect, delete its .locally.lock",
        path.display()
    )]
    CacheLocked { path: PathBuf },
}

impl BootstrapError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Format the command/exit/output tail appended to process-related errors.
fn render_command(command: Option<&str>, exit_code: Option<i32>, output: &str) -> String {
    let mut text = String::new();
    if let Some(command) = command {
        text.push_str(&format!("\n  command: {command}"));
    }
    if let Some(code) = exit_code {
        text.push_str(&format!("\n  exit code: {code}"));
    }
    if !output.trim().is_empty() {
        text.push_str("\noutput:");
        for line in output.lines() {
            text.push_str("\n  ");
            text.push_str(line);
        }
    }
    text
}
