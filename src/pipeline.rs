//! Image benchmarking pipeline module
//!
//! Directory scanning, TIFF decoding, compressor configuration and the
//! sweep/report driver, split into one module per concern.

pub mod common;
pub mod compression;
pub mod config;
pub mod conversions;
pub mod image;
pub mod report;

pub use common::{
    BenchError,
    Result,
};

pub use image::{
    DType,
    ImageData,
    ImageReader,
    PixelBuffer,
    TiffImageReader,
};

pub use compression::{
    BoundMode,
    BuiltinLibrary,
    CompressionLibrary,
    Compressor,
    CompressorConfig,
    ErrorBound,
    MetricPlugin,
    MetricValue,
    Metrics,
    build_config,
};

pub use report::{
    CsvReportWriter,
    METRIC_KEYS,
    MetricsRecord,
    ReportWriter,
};

pub use config::{
    BenchmarkConfig,
    BenchmarkConfigBuilder,
    FailurePolicy,
    RawConversionConfig,
};

pub use conversions::{
    BenchmarkPipeline,
    BenchmarkSummary,
    ImageToRawPipeline,
    RawConversionSummary,
    SweepOutcome,
};
