//! Internal utility modules
//!
//! Shared functionality used by the other helpers.

pub mod hash;
pub mod progress;
