//! Pipeline conversions module
//!
//! Orchestration for the two entry points: image-to-raw conversion and the
//! compression benchmark sweep.

mod benchmark;
mod image_to_raw;


pub use benchmark::{BenchmarkPipeline, BenchmarkSummary, SweepOutcome};
pub use image_to_raw::{ImageToRawPipeline, RawConversionSummary};
