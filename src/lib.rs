//! depage - dependency age reporter
//!
//! Resolves the runtime dependencies of a project and reports the date each
//! dependency archive was created.

pub mod app;
pub mod archive;
pub mod change;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod resolve;
pub mod test_utils;
pub mod utils;

pub use error::{DepageError, Result};
