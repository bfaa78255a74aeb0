//! Common test utilities: scratch workspaces, fixture archives and a fake
//! archiver.

#![allow(dead_code)]

use locally::{Config, Manifest};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// "0123456789"
pub const PAYLOAD: &[u8] = b"0123456789";
/// SHA-1 record of `PAYLOAD`
pub const PAYLOAD_RECORD: &str = "87acec17cd9dcd20a716cc2cf67417b71c8a7016 10";

/// Stand-in for 7za understanding the two invocations the engine issues:
/// `x -y -bd -o<target> <archive>` copies the archive into `<target>/unpacked/`,
/// `x -so <archive> | x -y -si -ttar -o<target>` gunzips and untars.
/// Archives with "corrupt" in the name fail like a real data error.
pub const FAKE_ARCHIVER: &str = r#"#!/bin/sh
target=""
archive=""
mode="copy"
for arg in "$@"; do
  case "$arg" in
    -o*) target="${arg#-o}" ;;
    -so) mode="decompress" ;;
    -si) mode="untar" ;;
    x|-y|-bd|-ttar) ;;
    *) archive="$arg" ;;
  esac
done
case "$archive" in
  *corrupt*)
    echo "7-Zip (a) 9.20"
    echo "Processing archive: $archive"
    echo "ERROR: Data Error"
    echo "Archives with Errors: 1"
    exit 2
    ;;
esac
case "$mode" in
  decompress) exec gzip -dc "$archive" ;;
  untar) mkdir -p "$target" && exec tar -xf - -C "$target" ;;
  *) mkdir -p "$target/unpacked" && cp "$archive" "$target/unpacked/" ;;
esac
"#;

/// Manifest entry for the fake archiver, pre-placed by `place_archiver`.
pub const ARCHIVER_ENTRY: &str = r#"
[[dependency]]
filename = "7za920.zip"
url = "http://127.0.0.1:9/never"
check = "7zip"
unpack_to = "7zip"
role = "archiver"
name = "7-Zip command line"
"#;

/// Scratch workspace with a quiet config rooted in it.
pub struct Workspace {
    pub dir: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path());
        config.quiet = true;
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache(&self) -> &Path {
        &self.config.cache_root
    }

    /// Write `locally.toml` into the workspace and load it.
    pub fn manifest(&self, text: &str) -> Manifest {
        let path = self.root().join("locally.toml");
        std::fs::write(&path, text).unwrap();
        Manifest::load(&path).unwrap()
    }

    /// Put a file straight into the cache, as if downloaded earlier.
    pub fn place(&self, filename: &str, content: &[u8]) {
        std::fs::create_dir_all(self.cache()).unwrap();
        std::fs::write(self.cache().join(filename), content).unwrap();
    }

    /// Put the fake archiver zip into the cache.
    pub fn place_archiver(&self) {
        std::fs::create_dir_all(self.cache()).unwrap();
        build_zip(
            &self.cache().join("7za920.zip"),
            &[("7za", FAKE_ARCHIVER.as_bytes(), 0o755)],
        );
    }
}

/// Build a zip of `(name, content, unix mode)` entries. Names ending in `/`
/// become directory entries.
pub fn build_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content, mode) in entries {
        let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }
    zip.finish().unwrap();
}
