//! HTTP download transport
//!
//! Streams a URL to a file on disk. No retries, no resume: a transfer that
//! fails part way removes what it wrote and reports `DownloadFailure`.

use crate::core::error::{BootstrapError, Result};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use super::super::internal::progress::{self, ProgressGuard, upgrade_to_bytes};

/// Default HTTP timeout in seconds. Toolchain archives are large.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Environment override for the HTTP timeout, in seconds
pub const HTTP_TIMEOUT_ENV: &str = "LOCALLY_HTTP_TIMEOUT";

/// HTTP timeout from `LOCALLY_HTTP_TIMEOUT`, clamped to 5..=3600 seconds.
fn http_timeout() -> Duration {
    let secs = std::env::var(HTTP_TIMEOUT_ENV)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs.clamp(5, 3600))
}

/// Download `url` into `dest`, returning the number of bytes written.
///
/// The parent directory of `dest` is created if needed. HTTP error statuses
/// and transport errors are `DownloadFailure`; local write errors are `Io`.
pub fn download(url: &str, dest: &Path, quiet: bool) -> Result<u64> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| BootstrapError::io(parent, e))?;
    }

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    let pb = progress::create_spinner(&format!("downloading {}", filename), quiet);
    let _guard = ProgressGuard::new(&pb);

    let response = ureq::get(url)
        .timeout(http_timeout())
        .call()
        .map_err(|e| BootstrapError::DownloadFailure {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        upgrade_to_bytes(&pb, len);
    }

    let mut file = std::fs::File::create(dest).map_err(|e| BootstrapError::io(dest, e))?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    let copied: Result<()> = loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                break Err(BootstrapError::DownloadFailure {
                    url: url.to_string(),
                    reason: format!("read error after {} bytes: {}", total_bytes, e),
                });
            }
        };

        if let Err(e) = file.write_all(&buffer[..n]) {
            break Err(BootstrapError::io(dest, e));
        }
        total_bytes += n as u64;
        pb.set_position(total_bytes);
    };

    let copied = copied.and_then(|()| file.flush().map_err(|e| BootstrapError::io(dest, e)));
    drop(file);

    if let Err(e) = copied {
        // The partial file was created by this call; it must not be mistaken
        // for a pre-existing download on the next run.
        let _ = std::fs::remove_file(dest);
        return Err(e);
    }

    Ok(total_bytes)
}
