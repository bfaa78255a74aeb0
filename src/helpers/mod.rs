//! Pipeline building blocks
//!
//! Each helper takes explicit inputs and returns explicit outputs, with no
//! hidden state. The engine sequences them.
//!
//! ## Categories
//!
//! - **acquire**: download, fetch cache
//! - **build**: zip extraction
//! - **util**: shell command execution
//! - **internal**: hashing, progress bars

pub mod acquire;
pub mod build;
pub mod internal;
pub mod util;
