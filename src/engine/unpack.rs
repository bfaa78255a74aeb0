//! Unpacking fetched dependencies into the cache root.
//!
//! Zip archives are extracted natively. Everything else goes through the
//! archiver, which is itself a zip dependency unpacked first.

use crate::core::config::Config;
use crate::core::error::{BootstrapError, Result};
use crate::core::manifest::{ArchiveKind, DependencySpec};
use crate::core::output;
use crate::helpers::build::{ExtractOptions, extract};
use crate::helpers::util::ProcessRunner;
use std::path::Path;

/// What unpacking did for one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackOutcome {
    /// `check_path` already existed.
    AlreadyUnpacked,
    Extracted,
}

/// Unpack `spec` unless its `check_path` already exists.
pub fn unpack_one(config: &Config, spec: &DependencySpec) -> Result<UnpackOutcome> {
    let cache_root = &config.cache_root;

    if cache_root.join(&spec.check_path).exists() {
        if !config.quiet {
            output::skip(&format!("{} is unpacked", spec.label()));
        }
        return Ok(UnpackOutcome::AlreadyUnpacked);
    }

    let target = spec.unpack_dir(cache_root);
    if !config.quiet {
        match &spec.unpack_to {
            Some(dir) => output::info(&format!("unpacking {} to {}", spec.label(), dir.display())),
            None => output::info(&format!("unpacking {}", spec.label())),
        }
    }

    let archive = cache_root.join(&spec.filename);
    match spec.archive_kind() {
        ArchiveKind::Zip => {
            extract(
                &archive,
                &target,
                spec.subdir.as_deref(),
                ExtractOptions::from(config),
            )?;
        }
        kind => run_archiver(config, kind, &archive, &target)?,
    }

    Ok(UnpackOutcome::Extracted)
}

/// Shell command that unpacks `archive` into `target` with the archiver.
pub fn archiver_command(archiver: &Path, kind: ArchiveKind, archive: &Path, target: &Path) -> String {
    let (archiver, archive, target) = (archiver.display(), archive.display(), target.display());
    match kind {
        ArchiveKind::CompressedTar => format!(
            "\"{archiver}\" x -so \"{archive}\" | \"{archiver}\" x -y -si -ttar -o\"{target}\""
        ),
        ArchiveKind::Zip | ArchiveKind::Other => {
            format!("\"{archiver}\" x -y -bd -o\"{target}\" \"{archive}\"")
        }
    }
}

fn run_archiver(config: &Config, kind: ArchiveKind, archive: &Path, target: &Path) -> Result<()> {
    let command = archiver_command(&config.archiver_path(), kind, archive, target);
    let result = ProcessRunner::new(command).run_capture_limited(config.archiver_capture_lines)?;

    if !result.success {
        return Err(BootstrapError::ExtractionFailure {
            archive: archive.to_path_buf(),
            reason: "archiver command failed".to_string(),
            command: Some(result.command),
            exit_code: Some(result.exit_code),
            output: result.output,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_compressed_tar_is_piped() {
        let cmd = archiver_command(
            Path::new("/c/7zip/7za"),
            ArchiveKind::CompressedTar,
            Path::new("/c/msys2.tar.xz"),
            Path::new("/c"),
        );
        assert_eq!(
            cmd,
            r#""/c/7zip/7za" x -so "/c/msys2.tar.xz" | "/c/7zip/7za" x -y -si -ttar -o"/c""#
        );
    }

    #[test]
    fn test_other_archive_is_direct() {
        let cmd = archiver_command(
            Path::new("/c/7zip/7za"),
            ArchiveKind::Other,
            Path::new("/c/gcc.7z"),
            Path::new("/c/mingw"),
        );
        assert_eq!(cmd, r#""/c/7zip/7za" x -y -bd -o"/c/mingw" "/c/gcc.7z""#);
    }

    #[test]
    fn test_check_path_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.quiet = true;
        std::fs::create_dir_all(config.cache_root.join("msys32")).unwrap();

        let spec = DependencySpec {
            filename: "msys2.tar.xz".to_string(),
            integrity: None,
            url: "http://127.0.0.1:9/never".to_string(),
            check_path: PathBuf::from("msys32"),
            display_name: None,
            unpack_to: None,
            subdir: None,
            role: Default::default(),
        };

        // The archive itself is absent; a skip never looks at it.
        assert_eq!(unpack_one(&config, &spec).unwrap(), UnpackOutcome::AlreadyUnpacked);
    }
}
