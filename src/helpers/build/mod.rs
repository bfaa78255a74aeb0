//! Unpacking helpers
//!
//! - **extract**: extract a zip archive, optionally a single subtree

pub mod extract;

pub use extract::{ExtractOptions, extract};
