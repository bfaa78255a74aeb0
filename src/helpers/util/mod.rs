//! Process helpers
//!
//! - **process**: pass-through and bounded-capture shell execution

pub mod process;

pub use process::{CommandResult, ProcessRunner};
