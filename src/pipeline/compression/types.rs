//! Compressor configuration types

use std::fmt;

use crate::pipeline::common::error::{BenchError, Result};
use crate::pipeline::image::types::DType;

/// Compressor families that accept the generic error-bound option.
pub const SUPPORTED_COMPRESSORS: [&str; 3] = ["sz", "zfp", "mgard"];

/// How a bound value is interpreted by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundMode {
    /// Maximum per-element deviation, in data units
    #[default]
    Absolute,
    /// Fraction of the input's value range (max - min)
    ValueRangeRelative,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorBound {
    Absolute(f64),
    ValueRangeRelative(f64),
}

impl ErrorBound {
    pub fn new(mode: BoundMode, value: f64) -> Self {
        match mode {
            BoundMode::Absolute => ErrorBound::Absolute(value),
            BoundMode::ValueRangeRelative => ErrorBound::ValueRangeRelative(value),
        }
    }

    /// The bound exactly as configured.
    pub fn value(&self) -> f64 {
        match *self {
            ErrorBound::Absolute(v) | ErrorBound::ValueRangeRelative(v) => v,
        }
    }

    /// Option name the bound is passed under.
    pub fn option_key(&self) -> &'static str {
        match self {
            ErrorBound::Absolute(_) => "pressio:abs",
            ErrorBound::ValueRangeRelative(_) => "pressio:rel",
        }
    }

    /// Resolves the bound to data units for an input spanning `value_range`.
    pub fn absolute_for(&self, value_range: f64) -> f64 {
        match *self {
            ErrorBound::Absolute(v) => v,
            // a constant image has no range to scale against
            ErrorBound::ValueRangeRelative(v) if value_range > 0.0 => v * value_range,
            ErrorBound::ValueRangeRelative(v) => v,
        }
    }
}

/// Instrumentation requested from the compression library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPlugin {
    Time,
    Size,
    ErrorStat,
}

impl MetricPlugin {
    pub const DEFAULT: [MetricPlugin; 3] = [MetricPlugin::Time, MetricPlugin::Size, MetricPlugin::ErrorStat];

    pub fn name(self) -> &'static str {
        match self {
            MetricPlugin::Time => "time",
            MetricPlugin::Size => "size",
            MetricPlugin::ErrorStat => "error_stat",
        }
    }
}

impl fmt::Display for MetricPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of one sweep iteration's compressor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressorConfig {
    pub compressor: String,
    pub error_bound: ErrorBound,
    pub dtype: DType,
    pub metric_plugins: Vec<MetricPlugin>,
}

impl CompressorConfig {
    pub fn with_bound_mode(mut self, mode: BoundMode) -> Self {
        self.error_bound = ErrorBound::new(mode, self.error_bound.value());
        self
    }

    pub fn with_metric_plugins(mut self, plugins: &[MetricPlugin]) -> Self {
        self.metric_plugins = plugins.to_vec();
        self
    }

    pub fn wants(&self, plugin: MetricPlugin) -> bool {
        self.metric_plugins.contains(&plugin)
    }
}

/// Builds the configuration for `compressor_id` with `bound` attached as an absolute error bound.
///
/// Only the families in [`SUPPORTED_COMPRESSORS`] understand the generic
/// bound option; anything else is rejected before a compressor is built.
pub fn build_config(compressor_id: &str, bound: f64, dtype: DType) -> Result<CompressorConfig> {
    if !SUPPORTED_COMPRESSORS.contains(&compressor_id) {
        return Err(BenchError::UnknownCompressor(compressor_id.to_string()));
    }

    Ok(CompressorConfig {
        compressor: compressor_id.to_string(),
        error_bound: ErrorBound::Absolute(bound),
        dtype,
        metric_plugins: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_is_attached_unchanged() {
        for id in SUPPORTED_COMPRESSORS {
            for bound in [0.5, 1.0, 1e-7, 0.1 + 0.2] {
                let config = build_config(id, bound, DType::F32).unwrap();

                assert_eq!(config.compressor, id);
                assert_eq!(config.error_bound, ErrorBound::Absolute(bound));
                assert_eq!(config.error_bound.value().to_bits(), bound.to_bits());
                assert_eq!(config.dtype, DType::F32);
            }
        }
    }

    #[test]
    fn test_unknown_compressor_is_rejected() {
        let result = build_config("blosc", 0.5, DType::U16);

        match result {
            Err(BenchError::UnknownCompressor(id)) => assert_eq!(id, "blosc"),
            other => panic!("expected unknown compressor, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_mode_keeps_value() {
        let config = build_config("sz", 0.01, DType::F64)
            .unwrap()
            .with_bound_mode(BoundMode::ValueRangeRelative);

        assert_eq!(config.error_bound, ErrorBound::ValueRangeRelative(0.01));
        assert_eq!(config.error_bound.option_key(), "pressio:rel");
        assert_eq!(config.error_bound.absolute_for(200.0), 2.0);
        assert_eq!(config.error_bound.absolute_for(0.0), 0.01);
    }

    #[test]
    fn test_metric_plugins() {
        let config = build_config("zfp", 1.0, DType::U8)
            .unwrap()
            .with_metric_plugins(&MetricPlugin::DEFAULT);

        assert!(config.wants(MetricPlugin::Time));
        assert!(config.wants(MetricPlugin::ErrorStat));
        assert_eq!(config.metric_plugins.len(), 3);
    }
}
