//! Compression module
//!
//! Compressor configuration, the compression-collaborator traits, and the
//! built-in error-bounded compressors used when no native library is linked.

mod builtin;
mod error_stats;
mod library;
mod quantizer;
mod timing;
pub mod types;

pub use builtin::BuiltinLibrary;
pub use error_stats::ErrorStats;
pub use library::{CompressionLibrary, Compressor, MetricValue, Metrics};
pub use timing::Timer;
pub use types::{
    BoundMode, CompressorConfig, ErrorBound, MetricPlugin, SUPPORTED_COMPRESSORS, build_config,
};
