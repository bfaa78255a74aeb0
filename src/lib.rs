//! Secure fetch, verify and unpack of pinned binary dependencies
//!
//! `locally` materializes a declared set of external binary dependencies into
//! a local cache, verifies each one against a pinned hash and size, unpacks
//! archives once, and then drives long-running external build commands.
//!
//! # Example Manifest
//!
//! ```toml
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
//!
//! # Integrity Records
//!
//! `"<hex-digest> <size>"`. The digest length picks the algorithm: 40 hex
//! characters is SHA-1, 64 is SHA-256, 128 is SHA-512. A dependency without a
//! record is fetched unchecked and reported with a warning.
//!
//! # Cache Layout
//!
//! Downloads and extracted trees share one cache root (default
//! `<workspace>/.locally`). An entry counts as unpacked when its `check` path
//! exists under the cache root; there is no other state.

pub mod core;
pub mod engine;
pub mod helpers;

pub use crate::core::{BootstrapError, Config, Manifest, Result};
pub use engine::{Orchestrator, UnpackOutcome};
pub use helpers::acquire::{FetchCache, FetchOutcome};
pub use helpers::internal::hash::{HashAlgorithm, IntegrityRecord};
pub use helpers::util::{CommandResult, ProcessRunner};
