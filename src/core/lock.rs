//! Cache lock management
//!
//! Provides exclusive locking so two runs never write the same cache.
//!
//! The lock is an fs2 advisory lock on `<cache>/.locally.lock`. The operating
//! system releases it when the holder exits, so a lock left behind by a crashed
//! run is reclaimed by the next `try_lock_exclusive`. The file itself stays in
//! the cache; unlinking it could let two runs lock different inodes.

use crate::core::error::{BootstrapError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file name inside the cache root
pub const LOCK_FILE_NAME: &str = ".locally.lock";

/// Acquire an exclusive lock on `cache_root`, creating the directory if needed.
/// Returns a guard that releases the lock when dropped.
pub fn acquire_cache_lock(cache_root: &Path) -> Result<CacheLock> {
    std::fs::create_dir_all(cache_root).map_err(|e| BootstrapError::io(cache_root, e))?;
    let lock_path = cache_root.join(LOCK_FILE_NAME);

    // Open without truncating: the file may belong to a live holder.
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| BootstrapError::io(&lock_path, e))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(BootstrapError::CacheLocked {
            path: cache_root.to_path_buf(),
        });
    }

    Ok(CacheLock {
        file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the cache lock - releases the lock when dropped
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
