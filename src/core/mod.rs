//! Core infrastructure: configuration, manifest, errors and status output.

pub mod config;
pub mod error;
pub mod lock;
pub mod manifest;
pub mod output;

pub use config::Config;
pub use error::{BootstrapError, Result};
pub use manifest::{BuildStage, DependencySpec, Manifest, Role};
