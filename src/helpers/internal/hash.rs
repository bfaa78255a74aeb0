//! Hash/size integrity records
//!
//! An integrity record pins a file by digest and byte size, written as
//! `"<hex-digest> <decimal-size>"`. The digest length selects the algorithm:
//! 40 hex chars is SHA-1 (the canonical form), 64 is SHA-256, 128 is SHA-512.

use crate::core::error::{BootstrapError, Result};
use sha2::Digest;
use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Chunk size for reading files during hashing (64KB)
const CHUNK_SIZE: usize = 64 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    fn from_hex_len(len: usize) -> Option<Self> {
        [Self::Sha1, Self::Sha256, Self::Sha512]
            .into_iter()
            .find(|a| a.hex_len() == len)
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(format!("unsupported hash algorithm: {other}")),
        }
    }
}

/// Expected (or computed) content fingerprint of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegrityRecord {
    digest: String,
    size: u64,
}

impl IntegrityRecord {
    /// Lower-case hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        // Construction guarantees the length matches one of the algorithms.
        HashAlgorithm::from_hex_len(self.digest.len()).unwrap_or_default()
    }
}

impl fmt::Display for IntegrityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.digest, self.size)
    }
}

impl FromStr for IntegrityRecord {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(digest), Some(size), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected '<hex-digest> <size>', got '{s}'"));
        };

        if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("digest is not hexadecimal: {digest}"));
        }
        if HashAlgorithm::from_hex_len(digest.len()).is_none() {
            return Err(format!(
                "digest has {} hex characters, expected 40 (sha1), 64 (sha256) or 128 (sha512)",
                digest.len()
            ));
        }
        if !size.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("size is not a decimal byte count: {size}"));
        }
        let size = size
            .parse::<u64>()
            .map_err(|e| format!("invalid size '{size}': {e}"))?;

        Ok(Self {
            digest: digest.to_ascii_lowercase(),
            size,
        })
    }
}

impl<'de> serde::Deserialize<'de> for IntegrityRecord {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-1 integrity record of a file.
pub fn compute(path: &Path) -> Result<IntegrityRecord> {
    compute_with(path, HashAlgorithm::Sha1, true)
}

/// Compute the integrity record of a file with the given algorithm.
///
/// Reads in 64KB chunks so memory stays flat regardless of file size.
/// Shows a percentage line for files larger than 100MB unless `quiet`.
pub fn compute_with(path: &Path, algorithm: HashAlgorithm, quiet: bool) -> Result<IntegrityRecord> {
    let mut f = std::fs::File::open(path).map_err(|e| BootstrapError::io(path, e))?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);
    let show_progress = !quiet && file_size > PROGRESS_THRESHOLD;

    let (digest, size) = match algorithm {
        HashAlgorithm::Sha1 => hash_with_progress::<sha1::Sha1>(&mut f, file_size, show_progress),
        HashAlgorithm::Sha256 => hash_with_progress::<sha2::Sha256>(&mut f, file_size, show_progress),
        HashAlgorithm::Sha512 => hash_with_progress::<sha2::Sha512>(&mut f, file_size, show_progress),
    }
    .map_err(|e| BootstrapError::io(path, e))?;

    Ok(IntegrityRecord { digest, size })
}

/// Check a file against an expected record.
///
/// The actual record is computed with the expected record's algorithm.
pub fn verify(path: &Path, expected: &IntegrityRecord) -> Result<()> {
    verify_quiet(path, expected, true)
}

pub(crate) fn verify_quiet(path: &Path, expected: &IntegrityRecord, quiet: bool) -> Result<()> {
    let actual = compute_with(path, expected.algorithm(), quiet)?;
    if &actual != expected {
        return Err(BootstrapError::IntegrityMismatch {
            path: path.to_path_buf(),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}

/// Hash a reader to completion, returning the hex digest and the byte count.
fn hash_with_progress<D: Digest>(
    reader: &mut impl Read,
    file_size: u64,
    show_progress: bool,
) -> io::Result<(String, u64)> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_read = 0u64;
    let mut last_percent = 0u8;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        hasher.update(&buffer[..n]);
        total_read += n as u64;

        if show_progress && file_size > 0 {
            let percent = ((total_read * 100) / file_size).min(100) as u8;
            if percent >= last_percent + 10 {
                eprint!("\r     checksum: {}%...", percent);
                last_percent = percent;
            }
        }
    }

    if show_progress {
        eprintln!();
    }

    Ok((hex::encode(hasher.finalize()), total_read))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-1 of "hello world"
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    fn write_temp(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.bin");
        std::fs::write(&file_path, content).unwrap();
        (temp_dir, file_path)
    }

    #[test]
    fn test_compute_sha1_record() {
        let (_dir, path) = write_temp(b"hello world");
        let record = compute(&path).unwrap();
        assert_eq!(record.to_string(), format!("{HELLO_SHA1} 11"));
        assert_eq!(record.algorithm(), HashAlgorithm::Sha1);
    }

    #[test]
    fn test_compute_empty_file() {
        let (_dir, path) = write_temp(b"");
        let record = compute(&path).unwrap();
        assert_eq!(record.to_string(), "da39a3ee5e6b4b0d3255bfef95601890afd80709 0");
    }

    #[test]
    fn test_compute_sha256_record() {
        let (_dir, path) = write_temp(b"hello world");
        let record = compute_with(&path, HashAlgorithm::Sha256, true).unwrap();
        assert_eq!(
            record.digest(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(record.size(), 11);
    }

    #[test]
    fn test_compute_is_deterministic_across_chunk_boundaries() {
        // Three full chunks plus a tail, so the incremental path is exercised.
        let content: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let (_dir, path) = write_temp(&content);
        let first = compute(&path).unwrap();
        let second = compute(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.size(), content.len() as u64);

        let mut hasher = sha1::Sha1::new();
        hasher.update(&content);
        assert_eq!(first.digest(), hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_single_byte_flip_changes_record() {
        let content = b"0123456789".to_vec();
        let (_dir, path) = write_temp(&content);
        let original = compute(&path).unwrap();

        for i in 0..content.len() {
            let mut tampered = content.clone();
            tampered[i] ^= 0x01;
            std::fs::write(&path, &tampered).unwrap();
            let err = verify(&path, &original).unwrap_err();
            assert!(matches!(err, BootstrapError::IntegrityMismatch { .. }), "byte {i}");
        }
    }

    #[test]
    fn test_verify_ok_has_no_side_effect() {
        let (_dir, path) = write_temp(b"hello world");
        let expected: IntegrityRecord = format!("{HELLO_SHA1} 11").parse().unwrap();
        verify(&path, &expected).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn test_verify_size_mismatch_alone_fails() {
        let (_dir, path) = write_temp(b"hello world");
        let expected: IntegrityRecord = format!("{HELLO_SHA1} 12").parse().unwrap();
        match verify(&path, &expected).unwrap_err() {
            BootstrapError::IntegrityMismatch { expected: e, actual, .. } => {
                assert_eq!(e.size(), 12);
                assert_eq!(actual.size(), 11);
                assert_eq!(e.digest(), actual.digest());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verify_uses_expected_algorithm() {
        let (_dir, path) = write_temp(b"hello world");
        let expected: IntegrityRecord =
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9 11"
                .parse()
                .unwrap();
        verify(&path, &expected).unwrap();
    }

    #[test]
    fn test_verify_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let expected: IntegrityRecord = format!("{HELLO_SHA1} 11").parse().unwrap();
        let err = verify(&dir.path().join("absent"), &expected).unwrap_err();
        assert!(matches!(err, BootstrapError::Io { .. }));
    }

    #[test]
    fn test_parse_record() {
        let record: IntegrityRecord = "9ce9ce89ebc070fea5d679936f21f9dde25faae0 384846"
            .parse()
            .unwrap();
        assert_eq!(record.digest(), "9ce9ce89ebc070fea5d679936f21f9dde25faae0");
        assert_eq!(record.size(), 384846);
    }

    #[test]
    fn test_parse_record_lowercases_digest() {
        let record: IntegrityRecord = "9CE9CE89EBC070FEA5D679936F21F9DDE25FAAE0 384846"
            .parse()
            .unwrap();
        assert_eq!(record.digest(), "9ce9ce89ebc070fea5d679936f21f9dde25faae0");
    }

    #[test]
    fn test_parse_record_rejects_malformed() {
        assert!("".parse::<IntegrityRecord>().is_err());
        assert!("9ce9ce89ebc070fea5d679936f21f9dde25faae0".parse::<IntegrityRecord>().is_err());
        assert!("9ce9ce89 384846".parse::<IntegrityRecord>().is_err());
        assert!("zzzzce89ebc070fea5d679936f21f9dde25faae0 1".parse::<IntegrityRecord>().is_err());
        assert!("9ce9ce89ebc070fea5d679936f21f9dde25faae0 -1".parse::<IntegrityRecord>().is_err());
        assert!("9ce9ce89ebc070fea5d679936f21f9dde25faae0 1 extra".parse::<IntegrityRecord>().is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
