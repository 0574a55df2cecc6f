//! Driver configuration types

use std::path::PathBuf;

use crate::pipeline::common::error::{BenchError, Result};
use crate::pipeline::compression::types::{BoundMode, MetricPlugin, SUPPORTED_COMPRESSORS};

pub const DEFAULT_INPUT_DIR: &str = "datasets/LA-UR-21-32202/raw";
pub const DEFAULT_EXTENSION: &str = ".tif";
pub const DEFAULT_REPORT: &str = "teststats.csv";
pub const DEFAULT_COMPRESSORS: [&str; 2] = ["sz", "zfp"];
pub const DEFAULT_BOUNDS: [f64; 2] = [0.5, 1.0];
pub const RAW_SUFFIX: &str = ".f32";

/// What happens to the rest of an image's sweep when one iteration fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next (compressor, bound) pair
    #[default]
    IsolateIteration,
    /// Skip every remaining pair for this image
    AbortImage,
}

/// Configuration for the image-to-raw converter
#[derive(Debug, Clone)]
pub struct RawConversionConfig {
    pub input_dir: PathBuf,
    /// Only entries whose name ends with this are converted
    pub extension: String,
    /// Appended to the input path to name the output file
    pub output_suffix: String,
}

impl Default for RawConversionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            output_suffix: RAW_SUFFIX.to_string(),
        }
    }
}

/// Configuration for the compression benchmark driver
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub input_dir: PathBuf,
    pub extension: String,
    /// CSV report, appended to across runs
    pub output_path: PathBuf,
    pub compressors: Vec<String>,
    pub bounds: Vec<f64>,
    pub bound_mode: BoundMode,
    pub failure_policy: FailurePolicy,
    pub metric_plugins: Vec<MetricPlugin>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            output_path: PathBuf::from(DEFAULT_REPORT),
            compressors: DEFAULT_COMPRESSORS.iter().map(|c| c.to_string()).collect(),
            bounds: DEFAULT_BOUNDS.to_vec(),
            bound_mode: BoundMode::Absolute,
            failure_policy: FailurePolicy::IsolateIteration,
            metric_plugins: MetricPlugin::DEFAULT.to_vec(),
        }
    }
}

impl BenchmarkConfig {
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::default()
    }

    /// Rejects configurations that would fail on every image.
    pub fn validate(&self) -> Result<()> {
        if self.compressors.is_empty() {
            return Err(BenchError::InvalidConfig("no compressors configured".to_string()));
        }
        if self.bounds.is_empty() {
            return Err(BenchError::InvalidConfig("no error bounds configured".to_string()));
        }
        if let Some(unknown) = self
            .compressors
            .iter()
            .find(|c| !SUPPORTED_COMPRESSORS.contains(&c.as_str()))
        {
            return Err(BenchError::UnknownCompressor(unknown.clone()));
        }
        Ok(())
    }

    /// Number of (compressor, bound) pairs run per image.
    pub fn sweep_len(&self) -> usize {
        self.compressors.len() * self.bounds.len()
    }
}

/// Builder for BenchmarkConfig
#[derive(Default)]
pub struct BenchmarkConfigBuilder {
    input_dir: Option<PathBuf>,
    extension: Option<String>,
    output_path: Option<PathBuf>,
    compressors: Option<Vec<String>>,
    bounds: Option<Vec<f64>>,
    bound_mode: Option<BoundMode>,
    failure_policy: Option<FailurePolicy>,
    metric_plugins: Option<Vec<MetricPlugin>>,
}

impl BenchmarkConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn compressors<I, S>(mut self, compressors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compressors = Some(compressors.into_iter().map(Into::into).collect());
        self
    }

    pub fn bounds(mut self, bounds: impl IntoIterator<Item = f64>) -> Self {
        self.bounds = Some(bounds.into_iter().collect());
        self
    }

    pub fn bound_mode(mut self, mode: BoundMode) -> Self {
        self.bound_mode = Some(mode);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn metric_plugins(mut self, plugins: impl IntoIterator<Item = MetricPlugin>) -> Self {
        self.metric_plugins = Some(plugins.into_iter().collect());
        self
    }

    pub fn build(self) -> BenchmarkConfig {
        let default = BenchmarkConfig::default();
        BenchmarkConfig {
            input_dir: self.input_dir.unwrap_or(default.input_dir),
            extension: self.extension.unwrap_or(default.extension),
            output_path: self.output_path.unwrap_or(default.output_path),
            compressors: self.compressors.unwrap_or(default.compressors),
            bounds: self.bounds.unwrap_or(default.bounds),
            bound_mode: self.bound_mode.unwrap_or(default.bound_mode),
            failure_policy: self.failure_policy.unwrap_or(default.failure_policy),
            metric_plugins: self.metric_plugins.unwrap_or(default.metric_plugins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchmarkConfig::default();

        assert_eq!(config.compressors, vec!["sz", "zfp"]);
        assert_eq!(config.bounds, vec![0.5, 1.0]);
        assert_eq!(config.output_path, PathBuf::from("teststats.csv"));
        assert_eq!(config.extension, ".tif");
        assert_eq!(config.failure_policy, FailurePolicy::IsolateIteration);
        assert_eq!(config.sweep_len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = BenchmarkConfig::builder()
            .input_dir("/data/in")
            .output_path("/tmp/out.csv")
            .compressors(["mgard"])
            .bounds([0.1])
            .bound_mode(BoundMode::ValueRangeRelative)
            .failure_policy(FailurePolicy::AbortImage)
            .build();

        assert_eq!(config.input_dir, PathBuf::from("/data/in"));
        assert_eq!(config.compressors, vec!["mgard"]);
        assert_eq!(config.bounds, vec![0.1]);
        assert_eq!(config.bound_mode, BoundMode::ValueRangeRelative);
        assert_eq!(config.failure_policy, FailurePolicy::AbortImage);
        assert_eq!(config.metric_plugins, MetricPlugin::DEFAULT.to_vec());
    }

    #[test]
    fn test_validate_rejects_unknown_compressor() {
        let config = BenchmarkConfig::builder().compressors(["sz", "lz4"]).build();

        assert!(matches!(config.validate(), Err(BenchError::UnknownCompressor(c)) if c == "lz4"));
    }

    #[test]
    fn test_validate_rejects_empty_sweep() {
        let no_bounds = BenchmarkConfig::builder().bounds(Vec::new()).build();
        let no_compressors = BenchmarkConfig::builder().compressors(Vec::<String>::new()).build();

        assert!(matches!(no_bounds.validate(), Err(BenchError::InvalidConfig(_))));
        assert!(matches!(no_compressors.validate(), Err(BenchError::InvalidConfig(_))));
    }
}
