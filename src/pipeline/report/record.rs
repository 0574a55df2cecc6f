//! Typed metrics record

use crate::pipeline::compression::{MetricValue, Metrics};

pub const COMPRESSOR_KEY: &str = "info:compressor";
pub const BOUND_KEY: &str = "info:bound";

/// Report columns, in order.
pub const METRIC_KEYS: [&str; 7] = [
    COMPRESSOR_KEY,
    BOUND_KEY,
    "size:compression_ratio",
    "composite:compression_rate",
    "error_stat:psnr",
    "error_stat:rmse",
    "error_stat:mse",
];

/// The allow-listed metrics of one (image, compressor, bound) run.
///
/// A field is `None` when the compressor did not report it or reported a
/// zero/empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRecord {
    pub compressor: Option<String>,
    pub bound: Option<f64>,
    pub compression_ratio: Option<f64>,
    pub compression_rate: Option<f64>,
    pub psnr: Option<f64>,
    pub rmse: Option<f64>,
    pub mse: Option<f64>,
}

impl MetricsRecord {
    /// Keeps the allow-listed keys of `metrics`; everything else is dropped here.
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let get = |key: &str| metrics.get(key).filter(|v| v.is_truthy());
        let number = |key: &str| get(key).and_then(MetricValue::as_f64);

        Self {
            compressor: get(COMPRESSOR_KEY).map(|v| v.to_string()),
            bound: number(BOUND_KEY),
            compression_ratio: number(METRIC_KEYS[2]),
            compression_rate: number(METRIC_KEYS[3]),
            psnr: number(METRIC_KEYS[4]),
            rmse: number(METRIC_KEYS[5]),
            mse: number(METRIC_KEYS[6]),
        }
    }

    /// One cell per entry of [`METRIC_KEYS`], `None` where the value is absent.
    pub fn cells(&self) -> [Option<String>; 7] {
        [
            self.compressor.clone(),
            self.bound.map(format_float),
            self.compression_ratio.map(format_float),
            self.compression_rate.map(format_float),
            self.psnr.map(format_float),
            self.rmse.map(format_float),
            self.mse.map(format_float),
        ]
    }

    /// Present fields only, in column order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        METRIC_KEYS
            .iter()
            .zip(self.cells())
            .filter_map(|(key, cell)| cell.map(|value| (*key, value)))
            .collect()
    }
}

/// Shortest round-trip text, with lowercase `inf`/`nan` for non-finite values.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        v.to_string()
    }
}
