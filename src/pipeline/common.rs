//! Common utilities module
//!
//! Shared error type and directory scanning used by both drivers.

pub mod error;
pub mod scan;

pub use error::{BenchError, Result};
pub use scan::scan_directory;
