//! Acquire helpers - getting dependency files into the cache
//!
//! - **download**: stream an HTTP(S) URL to disk
//! - **fetch**: make sure every declared file is present and verified

pub mod download;
pub mod fetch;

pub use download::download;
pub use fetch::{FetchCache, FetchOutcome};
