//! Fetch cache
//!
//! Makes sure every declared file is present in the cache and matches its
//! integrity record, downloading only what is missing.
//!
//! Rollback is asymmetric: a file downloaded by this run that fails
//! verification is deleted, a file that was already there is left alone and
//! reported. The pipeline never destroys data it did not create.

use crate::core::config::Config;
use crate::core::error::{BootstrapError, Result};
use crate::core::manifest::DependencySpec;
use crate::core::output;
use std::path::Path;

use super::super::internal::hash;
use super::download;

/// What `ensure` did for one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Present and matching its record. No network access.
    AlreadyVerified,
    /// Present, no record declared. No network access.
    AlreadyPresentUnchecked,
    /// Downloaded and verified.
    Downloaded,
    /// Downloaded, no record declared.
    DownloadedUnchecked,
}

/// Ensures dependency files exist in a target directory.
pub struct FetchCache<'a> {
    config: &'a Config,
}

impl<'a> FetchCache<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Process `specs` in list order, stopping at the first failure.
    pub fn ensure(&self, target_dir: &Path, specs: &[DependencySpec]) -> Result<Vec<FetchOutcome>> {
        specs
            .iter()
            .map(|spec| self.ensure_one(target_dir, spec))
            .collect()
    }

    /// Make sure a single dependency file is present and correct.
    pub fn ensure_one(&self, target_dir: &Path, spec: &DependencySpec) -> Result<FetchOutcome> {
        let filepath = target_dir.join(&spec.filename);

        if filepath.exists() {
            let Some(expected) = &spec.integrity else {
                self.note(&format!("skipping - {:<32} - downloaded, no hashsize", spec.filename));
                return Ok(FetchOutcome::AlreadyPresentUnchecked);
            };

            // Pre-existing file: a mismatch is reported, never deleted.
            hash::verify_quiet(&filepath, expected, self.config.quiet)?;
            self.note(&format!("skipping - {:<32} - downloaded, hashsize ok", spec.filename));
            return Ok(FetchOutcome::AlreadyVerified);
        }

        if !self.config.quiet {
            output::info(&format!(
                "Downloading {} into {}",
                spec.filename,
                target_dir.display()
            ));
        }
        download::download(&spec.url, &filepath, self.config.quiet)?;

        let Some(expected) = &spec.integrity else {
            output::warning(&format!(
                "hash/size is not set for {}, skipping integrity check",
                spec.filename
            ));
            return Ok(FetchOutcome::DownloadedUnchecked);
        };

        self.note(&format!("checking hash/size for {}", filepath.display()));
        discard_on_failure(
            &filepath,
            hash::verify_quiet(&filepath, expected, self.config.quiet),
        )?;

        Ok(FetchOutcome::Downloaded)
    }

    fn note(&self, message: &str) {
        if !self.config.quiet {
            output::detail(message);
        }
    }
}

/// Remove a file this run downloaded if its check failed, for any reason.
/// The check's error is returned even when the removal fails.
fn discard_on_failure(filepath: &Path, checked: Result<()>) -> Result<()> {
    if checked.is_err()
        && let Err(err) = std::fs::remove_file(filepath)
    {
        output::warning(&format!(
            "could not remove {} after failed verification: {}",
            filepath.display(),
            err
        ));
    }
    checked
}
