//! Zip extraction
//!
//! Extracts a zip archive, or one subtree of it, into a target directory.
//! Used directly for zip dependencies and to bootstrap the archiver that
//! unpacks everything else.
//!
//! Entry names are trusted as-is unless `strict_paths` is set: an entry such
//! as `../x` or `/etc/x` writes outside the target. With `strict_paths` such
//! entries fail the extraction instead.

use crate::core::config::Config;
use crate::core::error::{BootstrapError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::super::internal::progress::{self, ProgressGuard};

/// Knobs for a single extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub strict_paths: bool,
    pub quiet: bool,
}

impl From<&Config> for ExtractOptions {
    fn from(config: &Config) -> Self {
        Self {
            strict_paths: config.strict_paths,
            quiet: config.quiet,
        }
    }
}

fn malformed(archive: &Path, reason: impl ToString) -> BootstrapError {
    BootstrapError::ExtractionFailure {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
        command: None,
        exit_code: None,
        output: String::new(),
    }
}

/// Reject entry names that would land outside the target directory.
fn check_entry_path(archive: &Path, name: &str) -> Result<()> {
    let mut segments = name.split(['/', '\\']);
    let escapes = name.starts_with('/')
        || name.starts_with('\\')
        || Path::new(name).is_absolute()
        || segments.clone().next().is_some_and(|first| first.contains(':'))
        || segments.any(|seg| seg == "..");

    if escapes {
        return Err(malformed(
            archive,
            format!("entry escapes the target directory: {}", name),
        ));
    }
    Ok(())
}

/// Extract `archive` into `target`.
///
/// With `subdir`, only entries under `subdir/` are extracted and that prefix
/// is stripped, so `a/x.txt` with `subdir = "a"` becomes `target/x.txt`.
/// Existing files are overwritten. A failure part way leaves what was already
/// written in place.
///
/// Returns the number of files written.
pub fn extract(
    archive: &Path,
    target: &Path,
    subdir: Option<&str>,
    options: ExtractOptions,
) -> Result<usize> {
    let file = File::open(archive).map_err(|e| BootstrapError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| malformed(archive, e))?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let pb = progress::create_spinner(&format!("extracting {}", filename), options.quiet);
    let _guard = ProgressGuard::new(&pb);

    let prefix = subdir.map(|s| format!("{}/", s.trim_end_matches('/')));
    // Directories known to exist; many zips have no directory entries.
    let mut dirs: HashSet<PathBuf> = HashSet::new();
    let mut written = 0usize;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| malformed(archive, e))?;
        let name = entry.name().to_string();

        let relative = match &prefix {
            Some(prefix) => match name.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => continue,
            },
            None => name.clone(),
        };

        if options.strict_paths {
            check_entry_path(archive, &relative)?;
        }

        if relative.is_empty() || relative.ends_with('/') {
            let dir = target.join(relative.trim_end_matches('/'));
            if !dirs.contains(&dir) {
                if !dir.exists() {
                    std::fs::create_dir_all(&dir).map_err(|e| BootstrapError::io(&dir, e))?;
                }
                dirs.insert(dir);
            }
            continue;
        }

        let outpath = target.join(&relative);
        if let Some(parent) = outpath.parent()
            && !dirs.contains(parent)
        {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| BootstrapError::io(parent, e))?;
            }
            dirs.insert(parent.to_path_buf());
        }

        let mut outfile = File::create(&outpath).map_err(|e| BootstrapError::io(&outpath, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            // Corrupt compressed data surfaces as InvalidData from the reader.
            if e.kind() == std::io::ErrorKind::InvalidData {
                malformed(archive, format!("{}: {}", name, e))
            } else {
                BootstrapError::io(&outpath, e)
            }
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| BootstrapError::io(&outpath, e))?;
            }
        }

        written += 1;
    }

    Ok(written)
}
