//! Checks run before anything touches the cache.

use crate::core::config::Config;
use crate::core::error::{BootstrapError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Fail with `PreconditionViolation` if the environment is unfit.
pub fn check(config: &Config) -> Result<()> {
    check_cache_path(&config.cache_root, &config.forbidden_path_chars)?;
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    check_conflicting_tools(&config.conflicting_tools, &path_var)
}

fn check_cache_path(cache_root: &Path, forbidden: &[String]) -> Result<()> {
    let text = cache_root.to_string_lossy();
    if let Some(bad) = forbidden.iter().find(|c| !c.is_empty() && text.contains(c.as_str())) {
        return Err(BootstrapError::PreconditionViolation {
            check: "cache path".to_string(),
            detail: format!("{} contains forbidden character {:?}", text, bad),
        });
    }
    Ok(())
}

fn check_conflicting_tools(tools: &[String], path_var: &OsStr) -> Result<()> {
    for tool in tools {
        if let Some(found) = find_on_path(tool, path_var) {
            return Err(BootstrapError::PreconditionViolation {
                check: "conflicting tool".to_string(),
                detail: format!(
                    "{} is already on PATH at {}; remove it from PATH and retry",
                    tool,
                    found.display()
                ),
            });
        }
    }
    Ok(())
}

/// First executable named `tool` in the directories of `path_var`.
pub fn find_on_path(tool: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{}.exe", tool));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
