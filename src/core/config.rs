//! Run configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. the user settings file (`~/.config/locally/settings.toml`)
//! 2. the `[settings]` table of the manifest
//! 3. command-line overrides
//!
//! The merged result is a [`Config`] built once and passed by reference to
//! every component.

use crate::core::error::{BootstrapError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default cache directory name, relative to the workspace root
pub const DEFAULT_CACHE_DIR: &str = ".locally";

/// Default archiver location, relative to the cache root
#[cfg(windows)]
pub const DEFAULT_ARCHIVER: &str = "7zip/7za.exe";
#[cfg(not(windows))]
pub const DEFAULT_ARCHIVER: &str = "7zip/7za";

/// Archiver output is only interesting when it fails; keep the tail short.
pub const DEFAULT_ARCHIVER_CAPTURE_LINES: usize = 10;

/// Settings as they appear in TOML. Every field is optional so layers merge.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SettingsToml {
    pub cache: Option<PathBuf>,
    pub archiver: Option<PathBuf>,
    pub archiver_capture_lines: Option<usize>,
    pub strict_paths: Option<bool>,
    pub quiet: Option<bool>,
    pub forbidden_path_chars: Option<Vec<String>>,
    pub conflicting_tools: Option<Vec<String>>,
}

impl SettingsToml {
    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: SettingsToml) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.archiver.is_some() {
            self.archiver = other.archiver;
        }
        if other.archiver_capture_lines.is_some() {
            self.archiver_capture_lines = other.archiver_capture_lines;
        }
        if other.strict_paths.is_some() {
            self.strict_paths = other.strict_paths;
        }
        if other.quiet.is_some() {
            self.quiet = other.quiet;
        }
        if other.forbidden_path_chars.is_some() {
            self.forbidden_path_chars = other.forbidden_path_chars;
        }
        if other.conflicting_tools.is_some() {
            self.conflicting_tools = other.conflicting_tools;
        }
    }
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the manifest lives in; build stages run relative to it.
    pub workspace_root: PathBuf,
    /// Cache root holding downloads and extracted trees.
    pub cache_root: PathBuf,
    /// Archiver executable, relative to the cache root.
    pub archiver: PathBuf,
    pub archiver_capture_lines: usize,
    /// Reject archive entries that would escape the target directory.
    pub strict_paths: bool,
    pub quiet: bool,
    /// Characters the cache root path must not contain.
    pub forbidden_path_chars: Vec<String>,
    /// Executables that must not already be on PATH.
    pub conflicting_tools: Vec<String>,
}

impl Config {
    /// Configuration with defaults for a workspace root.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            cache_root: workspace_root.join(DEFAULT_CACHE_DIR),
            workspace_root,
            archiver: PathBuf::from(DEFAULT_ARCHIVER),
            archiver_capture_lines: DEFAULT_ARCHIVER_CAPTURE_LINES,
            strict_paths: false,
            quiet: false,
            forbidden_path_chars: vec![" ".to_string()],
            conflicting_tools: Vec::new(),
        }
    }

    /// Build a config from merged settings. Relative `cache` paths are
    /// resolved against the workspace root.
    pub fn from_settings(workspace_root: impl Into<PathBuf>, settings: SettingsToml) -> Self {
        let mut config = Self::new(workspace_root);
        if let Some(cache) = settings.cache {
            config.cache_root = if cache.is_absolute() {
                cache
            } else {
                config.workspace_root.join(cache)
            };
        }
        if let Some(archiver) = settings.archiver {
            config.archiver = archiver;
        }
        if let Some(lines) = settings.archiver_capture_lines {
            config.archiver_capture_lines = lines;
        }
        if let Some(strict) = settings.strict_paths {
            config.strict_paths = strict;
        }
        if let Some(quiet) = settings.quiet {
            config.quiet = quiet;
        }
        if let Some(chars) = settings.forbidden_path_chars {
            config.forbidden_path_chars = chars;
        }
        if let Some(tools) = settings.conflicting_tools {
            config.conflicting_tools = tools;
        }
        config
    }

    /// Absolute path of the archiver executable.
    pub fn archiver_path(&self) -> PathBuf {
        self.cache_root.join(&self.archiver)
    }
}

/// Location of the user-level settings file, if a config dir exists.
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("locally").join("settings.toml"))
}

/// Read a settings file. A missing file yields empty settings.
pub fn load_settings_file(path: &Path) -> Result<SettingsToml> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SettingsToml::default()),
        Err(e) => return Err(BootstrapError::io(path, e)),
    };
    toml::from_str(&text).map_err(|e| BootstrapError::Manifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
