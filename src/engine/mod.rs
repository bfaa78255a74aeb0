//! Bootstrap orchestration
//!
//! Drives the pipeline strictly in sequence:
//! 1. preflight - environment checks, before the cache is touched
//! 2. fetch - every dependency present and verified
//! 3. unpack - archiver first, then everything else, skipping unpacked entries
//! 4. stages - external build commands
//!
//! The cache lock is held from the first write to the end of the run.

pub mod preflight;
pub mod stages;
pub mod unpack;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::lock::{CacheLock, acquire_cache_lock};
use crate::core::manifest::Manifest;
use crate::core::output;
use crate::helpers::acquire::{FetchCache, FetchOutcome};

pub use unpack::UnpackOutcome;

/// Runs a manifest against a configuration.
pub struct Orchestrator<'a> {
    config: &'a Config,
    manifest: &'a Manifest,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, manifest: &'a Manifest) -> Self {
        Self { config, manifest }
    }

    /// Preflight, fetch, unpack and run every build stage.
    pub fn bootstrap(&self) -> Result<()> {
        let _lock = self.begin()?;
        self.fetch_all()?;
        self.unpack_all()?;
        self.run_stages()?;

        if !self.config.quiet {
            output::success("bootstrap complete");
        }
        Ok(())
    }

    /// Preflight and fetch only.
    pub fn fetch(&self) -> Result<Vec<FetchOutcome>> {
        let _lock = self.begin()?;
        self.fetch_all()
    }

    /// Preflight, fetch and unpack. No build stages.
    pub fn unpack(&self) -> Result<Vec<UnpackOutcome>> {
        let _lock = self.begin()?;
        self.fetch_all()?;
        self.unpack_all()
    }

    fn begin(&self) -> Result<CacheLock> {
        preflight::check(self.config)?;
        acquire_cache_lock(&self.config.cache_root)
    }

    fn fetch_all(&self) -> Result<Vec<FetchOutcome>> {
        self.header("download dependencies");
        FetchCache::new(self.config).ensure(&self.config.cache_root, &self.manifest.dependencies)
    }

    fn unpack_all(&self) -> Result<Vec<UnpackOutcome>> {
        self.header("unpack dependencies");
        // Validation put the archiver ahead of everything that needs it.
        self.manifest
            .dependencies
            .iter()
            .map(|spec| unpack::unpack_one(self.config, spec))
            .collect()
    }

    fn run_stages(&self) -> Result<()> {
        if self.manifest.stages.is_empty() {
            return Ok(());
        }
        self.header("build");
        stages::run_all(self.config, &self.manifest.stages)
    }

    fn header(&self, title: &str) {
        if !self.config.quiet {
            output::action(&format!("---[ {} ]---", title));
        }
    }
}
