use std::collections::BTreeMap;
use std::fmt;

use crate::pipeline::common::error::Result;
use crate::pipeline::compression::types::CompressorConfig;
use crate::pipeline::image::types::ImageData;

/// A single scalar reported by a compressor's metric plugins.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl MetricValue {
    /// Zero and empty text count as "no value"; NaN does not.
    pub fn is_truthy(&self) -> bool {
        match self {
            MetricValue::Float(v) => *v != 0.0,
            MetricValue::Integer(v) => *v != 0,
            MetricValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Float(v) => Some(*v),
            MetricValue::Integer(v) => Some(*v as f64),
            MetricValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Integer(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

/// Everything a compressor reports, keyed `plugin:name`.
pub type Metrics = BTreeMap<String, MetricValue>;

/// Factory for configured compressors.
pub trait CompressionLibrary {
    fn build(&self, config: &CompressorConfig) -> Result<Box<dyn Compressor>>;
}

/// One configured compressor instance.
///
/// Metrics accumulate across `encode`/`decode` calls and are read back with
/// [`Compressor::metrics`].
pub trait Compressor {
    fn encode(&mut self, input: &ImageData) -> Result<Vec<u8>>;

    /// Reconstructs `compressed` into `output`, which must have the input's
    /// shape and dtype. Every sample of `output` is overwritten.
    fn decode(&mut self, compressed: &[u8], output: &mut ImageData) -> Result<()>;

    fn metrics(&self) -> Metrics;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!MetricValue::Float(0.0).is_truthy());
        assert!(!MetricValue::Integer(0).is_truthy());
        assert!(!MetricValue::from("").is_truthy());
        assert!(MetricValue::Float(f64::NAN).is_truthy());
        assert!(MetricValue::Float(f64::INFINITY).is_truthy());
        assert!(MetricValue::from("sz").is_truthy());
    }
}
