//! Dependency manifest
//!
//! A manifest is a TOML file listing the files to fetch and the build stages
//! to run once everything is unpacked:
//!
//! ```toml
//! [settings]
//! archiver = "7zip/7za"
//!
//! [[dependency]]
//! filename = "7za920.zip"
//! integrity = "9ce9ce89ebc070fea5d679936f21f9dde25faae0 384846"
//! url = "http://downloads.sourceforge.net/sevenzip/7za920.zip"
//! check = "7zip"
//! unpack_to = "7zip"
//! role = "archiver"
//!
//! [[dependency]]
//! filename = "msys2-base-i686-20160205.tar.xz"
//! integrity = "2aa85b8995c8ab6fb080e15c8ed8b1195d7fc0f1 45676948"
//! url = "https://prdownloads.sourceforge.net/msys2/msys2-base-i686-20160205.tar.xz"
//! check = "msys32"
//!
//! [[stage]]
//! name = "toolchain"
//! command = "make -C build all"
//! capture = 200
//! ```

use crate::core::config::SettingsToml;
use crate::core::error::{BootstrapError, Result};
use crate::helpers::internal::hash::IntegrityRecord;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// What a dependency is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The archiver used to unpack every non-zip archive. Exactly one.
    Archiver,
    /// An ordinary archive unpacked into the cache.
    #[default]
    Archive,
}

/// How an archive gets unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Extracted natively.
    Zip,
    /// Tar wrapped in a compressor; the archiver decompresses to stdout and
    /// a second archiver process untars from stdin.
    CompressedTar,
    /// Anything else the archiver understands directly (.7z, .exe, ...).
    Other,
}

impl ArchiveKind {
    pub fn from_filename(filename: &str) -> Self {
        let name = filename.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Self::Zip
        } else if [".tar.gz", ".tgz", ".tar.xz", ".txz", ".tar.bz2", ".tbz2"]
            .iter()
            .any(|ext| name.ends_with(ext))
        {
            Self::CompressedTar
        } else {
            Self::Other
        }
    }
}

/// One declared dependency file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    /// File name inside the cache root. Unique per manifest.
    pub filename: String,
    /// Expected hash/size. `None` opts out of verification.
    #[serde(default, alias = "hashsize")]
    pub integrity: Option<IntegrityRecord>,
    pub url: String,
    /// Relative path whose existence means "already unpacked".
    #[serde(alias = "check")]
    pub check_path: PathBuf,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    /// Unpack into this subdirectory of the cache root.
    #[serde(default, alias = "unpackto")]
    pub unpack_to: Option<PathBuf>,
    /// Only extract this subtree of a zip archive.
    #[serde(default)]
    pub subdir: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl DependencySpec {
    /// Human-readable label for status lines.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.filename)
    }

    pub fn archive_kind(&self) -> ArchiveKind {
        ArchiveKind::from_filename(&self.filename)
    }

    /// Whether unpacking this entry needs the archiver.
    pub fn needs_archiver(&self) -> bool {
        self.archive_kind() != ArchiveKind::Zip
    }

    /// Directory this entry unpacks into.
    pub fn unpack_dir(&self, cache_root: &Path) -> PathBuf {
        match &self.unpack_to {
            Some(dir) => cache_root.join(dir),
            None => cache_root.to_path_buf(),
        }
    }
}

/// An external build command run after all dependencies are unpacked.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildStage {
    pub name: String,
    pub command: String,
    /// Working directory, relative to the workspace root.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Capture the last N lines instead of streaming output.
    #[serde(default)]
    pub capture: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestToml {
    #[serde(default)]
    settings: SettingsToml,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<DependencySpec>,
    #[serde(default, rename = "stage")]
    stages: Vec<BuildStage>,
}

/// A loaded and validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub settings: SettingsToml,
    pub dependencies: Vec<DependencySpec>,
    pub stages: Vec<BuildStage>,
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BootstrapError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse and validate manifest text. `path` is used for diagnostics.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let raw: ManifestToml = toml::from_str(text).map_err(|e| BootstrapError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let manifest = Self {
            path: path.to_path_buf(),
            settings: raw.settings,
            dependencies: raw.dependencies,
            stages: raw.stages,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Directory containing the manifest.
    pub fn workspace_root(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// The single archiver entry. Validation guarantees it exists.
    pub fn archiver(&self) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|d| d.role == Role::Archiver)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| BootstrapError::Manifest {
            path: self.path.clone(),
            reason,
        };

        let mut seen = HashSet::new();
        for dep in &self.dependencies {
            if dep.filename.is_empty()
                || dep.filename.contains('/')
                || dep.filename.contains('\\')
                || dep.filename == "."
                || dep.filename == ".."
            {
                return Err(invalid(format!("invalid filename '{}'", dep.filename)));
            }
            if !seen.insert(dep.filename.as_str()) {
                return Err(invalid(format!("duplicate filename '{}'", dep.filename)));
            }
            if dep.check_path.as_os_str().is_empty() || dep.check_path.is_absolute() {
                return Err(invalid(format!(
                    "check path for '{}' must be a non-empty relative path",
                    dep.filename
                )));
            }
            if let Some(dir) = &dep.unpack_to
                && dir.is_absolute()
            {
                return Err(invalid(format!(
                    "unpack_to for '{}' must be relative to the cache",
                    dep.filename
                )));
            }
            if dep.subdir.is_some() && dep.needs_archiver() {
                return Err(invalid(format!(
                    "subdir is only supported for zip archives ('{}')",
                    dep.filename
                )));
            }
        }

        let mut seen_stages = HashSet::new();
        for stage in &self.stages {
            if !seen_stages.insert(stage.name.as_str()) {
                return Err(invalid(format!("duplicate stage '{}'", stage.name)));
            }
        }

        self.validate_archiver_order()
    }

    /// Exactly one archiver, unpackable without itself, ahead of every entry
    /// that needs it.
    fn validate_archiver_order(&self) -> Result<()> {
        let archivers: Vec<usize> = self
            .dependencies
            .iter()
            .enumerate()
            .filter(|(_, d)| d.role == Role::Archiver)
            .map(|(i, _)| i)
            .collect();

        let archiver_index = match archivers.as_slice() {
            [index] => *index,
            [] => {
                return Err(BootstrapError::SpecOrderViolation {
                    detail: "no dependency has role = \"archiver\"".to_string(),
                });
            }
            _ => {
                let names: Vec<_> = archivers
                    .iter()
                    .map(|&i| self.dependencies[i].filename.as_str())
                    .collect();
                return Err(BootstrapError::SpecOrderViolation {
                    detail: format!("more than one archiver declared: {}", names.join(", ")),
                });
            }
        };

        let archiver = &self.dependencies[archiver_index];
        if archiver.needs_archiver() {
            return Err(BootstrapError::SpecOrderViolation {
                detail: format!(
                    "archiver '{}' must be a zip archive, it cannot unpack itself",
                    archiver.filename
                ),
            });
        }

        if let Some(early) = self.dependencies[..archiver_index]
            .iter()
            .find(|d| d.needs_archiver())
        {
            return Err(BootstrapError::SpecOrderViolation {
                detail: format!(
                    "'{}' needs the archiver but is listed before '{}'",
                    early.filename, archiver.filename
                ),
            });
        }

        Ok(())
    }
}
