//! Built-in compression library.
//!
//! Stand-ins for the `sz` and `zfp` families so a sweep can run without a
//! native compression library. Both are error-bounded: every finite sample
//! of a float image decodes within the configured bound. `mgard` passes
//! configuration but has no built-in implementation.

use std::collections::BTreeMap;

use tracing::debug;

use crate::pipeline::common::error::{BenchError, Result};
use crate::pipeline::compression::error_stats::ErrorStats;
use crate::pipeline::compression::library::{CompressionLibrary, Compressor, Metrics};
use crate::pipeline::compression::quantizer::{self, Scheme};
use crate::pipeline::compression::timing::{Timer, as_millis_f64};
use crate::pipeline::compression::types::{CompressorConfig, MetricPlugin};
use crate::pipeline::image::types::ImageData;

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLibrary;

impl CompressionLibrary for BuiltinLibrary {
    fn build(&self, config: &CompressorConfig) -> Result<Box<dyn Compressor>> {
        let scheme = match config.compressor.as_str() {
            "sz" => Scheme::Lorenzo,
            "zfp" => Scheme::Block,
            "mgard" => {
                return Err(BenchError::compressor(
                    "mgard",
                    "no built-in implementation is available",
                ));
            }
            other => return Err(BenchError::UnknownCompressor(other.to_string())),
        };

        let bound = config.error_bound.value();
        if !bound.is_finite() || bound <= 0.0 {
            return Err(BenchError::compressor(
                &config.compressor,
                format!("{} must be a positive finite number, got {}", config.error_bound.option_key(), bound),
            ));
        }

        debug!(compressor = %config.compressor, ?scheme, bound, "Built compressor");
        Ok(Box::new(BuiltinCompressor {
            config: config.clone(),
            scheme,
            original: None,
            uncompressed_size: None,
            compressed_size: None,
            timings: BTreeMap::new(),
            error_stats: None,
        }))
    }
}

struct BuiltinCompressor {
    config: CompressorConfig,
    scheme: Scheme,
    /// Input samples kept for `error_stat`; only retained when that plugin is requested
    original: Option<Vec<f64>>,
    uncompressed_size: Option<usize>,
    compressed_size: Option<usize>,
    /// Milliseconds per timed step, keyed by the metric they are reported under
    timings: BTreeMap<String, f64>,
    error_stats: Option<ErrorStats>,
}

const COMPRESS_TIME: &str = "time:compress";
const DECOMPRESS_TIME: &str = "time:decompress";

impl BuiltinCompressor {
    fn record_time(&mut self, timer: Timer) {
        let (name, elapsed) = timer.stop();
        self.timings.insert(name, as_millis_f64(elapsed));
    }

    fn fail(&self, message: impl std::fmt::Display) -> BenchError {
        BenchError::compressor(&self.config.compressor, message.to_string())
    }
}

fn finite_range(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min <= max { max - min } else { 0.0 }
}

impl Compressor for BuiltinCompressor {
    fn encode(&mut self, input: &ImageData) -> Result<Vec<u8>> {
        let timer = Timer::start(COMPRESS_TIME);
        let values = input.pixels.to_f64();
        let abs_bound = self.config.error_bound.absolute_for(finite_range(&values));

        let stream = quantizer::encode(&values, input.height, input.row_len(), abs_bound, self.scheme)
            .map_err(|e| self.fail(e))?;
        self.record_time(timer);

        self.uncompressed_size = Some(input.byte_len());
        self.compressed_size = Some(stream.len());
        if self.config.wants(MetricPlugin::ErrorStat) {
            self.original = Some(values);
        }

        debug!(
            compressor = %self.config.compressor,
            abs_bound,
            uncompressed = input.byte_len(),
            compressed = stream.len(),
            "Encoded"
        );
        Ok(stream)
    }

    fn decode(&mut self, compressed: &[u8], output: &mut ImageData) -> Result<()> {
        let timer = Timer::start(DECOMPRESS_TIME);
        let values = quantizer::decode(compressed, self.scheme, output.pixels.len())
            .map_err(|e| self.fail(e))?;
        output.pixels.overwrite_from_f64(&values).map_err(|e| self.fail(e))?;
        self.record_time(timer);

        if let Some(original) = &self.original {
            // compare what the caller actually receives, after the cast back to the image dtype
            self.error_stats = ErrorStats::compute(original, &output.pixels.to_f64());
        }
        Ok(())
    }

    fn metrics(&self) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert(
            self.config.error_bound.option_key().to_string(),
            self.config.error_bound.value().into(),
        );

        let wants_time = self.config.wants(MetricPlugin::Time);
        let wants_size = self.config.wants(MetricPlugin::Size);

        if wants_time {
            for (name, ms) in &self.timings {
                metrics.insert(name.clone(), (*ms).into());
            }
        }

        if let (true, Some(uncompressed), Some(compressed)) =
            (wants_size, self.uncompressed_size, self.compressed_size)
        {
            let elements = uncompressed / self.config.dtype.size_of();
            metrics.insert("size:uncompressed_size".into(), (uncompressed as i64).into());
            metrics.insert("size:compressed_size".into(), (compressed as i64).into());
            if compressed > 0 {
                metrics.insert(
                    "size:compression_ratio".into(),
                    (uncompressed as f64 / compressed as f64).into(),
                );
            }
            if elements > 0 {
                metrics.insert(
                    "size:bit_rate".into(),
                    (compressed as f64 * 8.0 / elements as f64).into(),
                );
            }

            if wants_time {
                // bytes per millisecond
                if let Some(&ms) = self.timings.get(COMPRESS_TIME).filter(|ms| **ms > 0.0) {
                    metrics.insert("composite:compression_rate".into(), (uncompressed as f64 / ms).into());
                }
                if let Some(&ms) = self.timings.get(DECOMPRESS_TIME).filter(|ms| **ms > 0.0) {
                    metrics.insert("composite:decompression_rate".into(), (uncompressed as f64 / ms).into());
                }
            }
        }

        if let Some(stats) = &self.error_stats {
            stats.insert_into(&mut metrics);
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compression::library::MetricValue;
    use crate::pipeline::compression::types::{BoundMode, build_config};
    use crate::pipeline::image::types::{DType, PixelBuffer};

    fn gradient_f32(width: usize, height: usize) -> ImageData {
        let data = (0..width * height).map(|i| (i as f32 * 0.37).sin() * 50.0).collect();
        ImageData::new(width, height, 1, PixelBuffer::F32(data)).unwrap()
    }

    fn round_trip(id: &str, bound: f64, image: &ImageData) -> (ImageData, Metrics) {
        let config = build_config(id, bound, image.dtype())
            .unwrap()
            .with_metric_plugins(&MetricPlugin::DEFAULT);
        let mut compressor = BuiltinLibrary.build(&config).unwrap();
        let compressed = compressor.encode(image).unwrap();
        let mut scratch = image.clone();
        compressor.decode(&compressed, &mut scratch).unwrap();
        (scratch, compressor.metrics())
    }

    #[test]
    fn test_sz_and_zfp_honor_absolute_bound() {
        let image = gradient_f32(13, 9);
        let original = image.pixels.to_f64();

        for id in ["sz", "zfp"] {
            for bound in [0.5, 1.0] {
                let (decoded, metrics) = round_trip(id, bound, &image);
                for (o, d) in original.iter().zip(decoded.pixels.to_f64()) {
                    // f32 storage adds at most half an ulp on top of the bound
                    assert!((o - d).abs() <= bound + 1e-4, "{} at {}: {} vs {}", id, bound, o, d);
                }
                let max_error = metrics["error_stat:max_error"].as_f64().unwrap();
                assert!(max_error <= bound + 1e-4);
            }
        }
    }

    #[test]
    fn test_reports_requested_plugins() {
        let image = gradient_f32(16, 16);

        let (_, metrics) = round_trip("sz", 0.5, &image);

        for key in [
            "pressio:abs",
            "time:compress",
            "time:decompress",
            "size:compression_ratio",
            "size:compressed_size",
            "error_stat:psnr",
            "error_stat:rmse",
            "error_stat:mse",
        ] {
            assert!(metrics.contains_key(key), "missing {}", key);
        }
        assert_eq!(metrics["size:uncompressed_size"], MetricValue::Integer(16 * 16 * 4));
        assert!(metrics["size:compression_ratio"].as_f64().unwrap() > 1.0);
    }

    #[test]
    fn test_time_plugin_reports_each_timed_step() {
        let image = gradient_f32(8, 8);

        let (_, metrics) = round_trip("zfp", 1.0, &image);

        let timed: Vec<&str> = metrics
            .keys()
            .filter(|k| k.starts_with("time:"))
            .map(String::as_str)
            .collect();
        assert_eq!(timed, vec![COMPRESS_TIME, DECOMPRESS_TIME]);
        assert!(metrics[COMPRESS_TIME].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn test_no_plugins_means_no_instrumentation() {
        let image = gradient_f32(4, 4);
        let config = build_config("zfp", 0.5, DType::F32).unwrap();
        let mut compressor = BuiltinLibrary.build(&config).unwrap();
        let compressed = compressor.encode(&image).unwrap();
        let mut scratch = image.clone();
        compressor.decode(&compressed, &mut scratch).unwrap();

        let metrics = compressor.metrics();

        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("pressio:abs"));
    }

    #[test]
    fn test_integer_images_round_back_to_dtype() {
        let data: Vec<u16> = (0..64).map(|i| (i * 97 % 4096) as u16).collect();
        let image = ImageData::new(8, 8, 1, PixelBuffer::U16(data)).unwrap();

        let (decoded, _) = round_trip("sz", 1.0, &image);

        assert_eq!(decoded.dtype(), DType::U16);
        for (o, d) in image.pixels.to_f64().iter().zip(decoded.pixels.to_f64()) {
            assert!((o - d).abs() <= 1.5);
        }
    }

    #[test]
    fn test_relative_bound_scales_with_range() {
        let data: Vec<f64> = (0..100).map(|i| i as f64 * 10.0).collect();
        let image = ImageData::new(10, 10, 1, PixelBuffer::F64(data.clone())).unwrap();
        let config = build_config("sz", 0.01, DType::F64)
            .unwrap()
            .with_bound_mode(BoundMode::ValueRangeRelative)
            .with_metric_plugins(&MetricPlugin::DEFAULT);
        let mut compressor = BuiltinLibrary.build(&config).unwrap();
        let compressed = compressor.encode(&image).unwrap();
        let mut scratch = image.clone();
        compressor.decode(&compressed, &mut scratch).unwrap();

        // range 990 -> absolute bound 9.9
        let max_error = compressor.metrics()["error_stat:max_error"].as_f64().unwrap();
        assert!(max_error <= 9.9 + 1e-9);
        assert!(compressor.metrics().contains_key("pressio:rel"));
    }

    #[test]
    fn test_mgard_is_unavailable() {
        let config = build_config("mgard", 0.5, DType::F32).unwrap();

        let result = BuiltinLibrary.build(&config);

        assert!(matches!(result, Err(BenchError::CompressorError { ref compressor, .. }) if compressor == "mgard"));
    }

    #[test]
    fn test_non_positive_bound_fails() {
        let config = build_config("sz", 0.0, DType::F32).unwrap();

        assert!(BuiltinLibrary.build(&config).is_err());
    }

    #[test]
    fn test_huge_bound_never_decodes_to_nan() {
        let data: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let image = ImageData::new(4, 4, 1, PixelBuffer::F64(data.clone())).unwrap();

        let (decoded, metrics) = round_trip("sz", 1e308, &image);

        assert_eq!(decoded.pixels, PixelBuffer::F64(data));
        assert_eq!(metrics["error_stat:mse"], MetricValue::Float(0.0));
    }

    #[test]
    fn test_overflowing_relative_bound_never_decodes_to_nan() {
        let data = vec![-1e308, 1e308, 0.0, 5.0];
        let image = ImageData::new(2, 2, 1, PixelBuffer::F64(data.clone())).unwrap();
        let config = build_config("zfp", 0.9, DType::F64)
            .unwrap()
            .with_bound_mode(BoundMode::ValueRangeRelative);
        let mut compressor = BuiltinLibrary.build(&config).unwrap();
        let compressed = compressor.encode(&image).unwrap();
        let mut scratch = image.clone();

        compressor.decode(&compressed, &mut scratch).unwrap();

        assert_eq!(scratch.pixels, PixelBuffer::F64(data));
    }

    #[test]
    fn test_decode_rejects_foreign_stream() {
        let image = gradient_f32(4, 4);
        let config = build_config("sz", 0.5, DType::F32).unwrap();
        let mut compressor = BuiltinLibrary.build(&config).unwrap();
        let mut scratch = image.clone();

        let result = compressor.decode(b"garbage", &mut scratch);

        assert!(matches!(result, Err(BenchError::CompressorError { .. })));
    }
}
