use std::path::Path;

use tracing::{debug, error, info, instrument, warn};

use crate::pipeline::{
    common::{error::{BenchError, Result}, scan::scan_directory},
    compression::{BuiltinLibrary, CompressionLibrary, build_config},
    config::{BenchmarkConfig, FailurePolicy},
    image::{ImageData, ImageReader, TiffImageReader},
    report::{
        CsvReportWriter, MetricsRecord, ReportWriter,
        record::{BOUND_KEY, COMPRESSOR_KEY},
    },
};

/// Result of one (compressor, bound) iteration of a sweep.
#[derive(Debug)]
pub struct SweepOutcome {
    pub compressor: String,
    pub bound: f64,
    /// The record that was written to the report, or why the iteration failed
    pub result: Result<MetricsRecord>,
}

impl SweepOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BenchmarkSummary {
    pub images: usize,
    pub records_written: usize,
    pub failed_iterations: usize,
}

/// Runs every configured (compressor, bound) pair against each input image
/// and appends one report row per successful pair.
pub struct BenchmarkPipeline<R: ImageReader, L: CompressionLibrary, W: ReportWriter> {
    reader: R,
    library: L,
    writer: W,
    config: BenchmarkConfig,
}

impl BenchmarkPipeline<TiffImageReader, BuiltinLibrary, CsvReportWriter> {
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        let writer = CsvReportWriter::new(config.output_path.clone());
        Self::with_custom(TiffImageReader, BuiltinLibrary, writer, config)
    }
}

impl<R: ImageReader, L: CompressionLibrary, W: ReportWriter> BenchmarkPipeline<R, L, W> {
    pub fn with_custom(reader: R, library: L, writer: W, config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            library,
            writer,
            config,
        })
    }

    /// Runs the sweep for one decoded image.
    ///
    /// Iterations run in compressor-major order. A configuration error ends
    /// the sweep; other failures end it only under [`FailurePolicy::AbortImage`].
    #[instrument(skip(self, image), fields(width = image.width, height = image.height, dtype = %image.dtype()))]
    pub fn run_sweep(&mut self, image: &ImageData) -> Vec<SweepOutcome> {
        let compressors = self.config.compressors.clone();
        let bounds = self.config.bounds.clone();
        let mut outcomes = Vec::with_capacity(self.config.sweep_len());

        'sweep: for compressor in &compressors {
            for &bound in &bounds {
                let result = self.run_iteration(image, compressor, bound);

                let abort = match &result {
                    Ok(_) => false,
                    Err(e) => {
                        error!(
                            compressor = %compressor,
                            bound,
                            error = %e,
                            "Failed to compress using {} at bound {}", compressor, bound
                        );
                        e.is_configuration() || self.config.failure_policy == FailurePolicy::AbortImage
                    }
                };

                outcomes.push(SweepOutcome {
                    compressor: compressor.clone(),
                    bound,
                    result,
                });

                if abort {
                    let skipped = self.config.sweep_len() - outcomes.len();
                    if skipped > 0 {
                        warn!(skipped, "Aborting remaining sweep for this image");
                    }
                    break 'sweep;
                }
            }
        }

        outcomes
    }

    fn run_iteration(&mut self, image: &ImageData, compressor_id: &str, bound: f64) -> Result<MetricsRecord> {
        let _span = tracing::info_span!("iteration", compressor = compressor_id, bound).entered();

        let config = build_config(compressor_id, bound, image.dtype())?
            .with_bound_mode(self.config.bound_mode)
            .with_metric_plugins(&self.config.metric_plugins);
        let mut compressor = self.library.build(&config)?;

        let compressed = {
            let _span = tracing::info_span!("encode").entered();
            compressor.encode(image)?
        };

        // fresh target every iteration so a partial decode can't inherit an earlier result
        let mut scratch = image.clone();
        {
            let _span = tracing::info_span!("decode", compressed = compressed.len()).entered();
            compressor.decode(&compressed, &mut scratch)?;
        }

        let mut metrics = compressor.metrics();
        debug!(?metrics, "Compressor metrics");
        metrics.insert(COMPRESSOR_KEY.to_string(), compressor_id.into());
        metrics.insert(BOUND_KEY.to_string(), bound.into());

        let record = MetricsRecord::from_metrics(&metrics);
        info!(fields = ?record.fields(), "Metrics");

        self.writer.write_record(&record)?;
        Ok(record)
    }

    /// Reads one image and runs its sweep. Read and decode errors propagate.
    #[instrument(skip(self, input_path))]
    pub fn benchmark_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<Vec<SweepOutcome>> {
        let input_path = input_path.as_ref();
        info!(input = %input_path.display(), "Benchmarking file");

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                BenchError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let image = {
            let _span = tracing::info_span!("decode_image").entered();
            self.reader.read_image(&input_data)?
        };

        Ok(self.run_sweep(&image))
    }

    /// Benchmarks every matching image in the input directory, one at a time.
    pub fn run(&mut self) -> Result<BenchmarkSummary> {
        let images = scan_directory(&self.config.input_dir, &self.config.extension)?;
        info!(
            dir = %self.config.input_dir.display(),
            count = images.len(),
            compressors = ?self.config.compressors,
            bounds = ?self.config.bounds,
            "Starting benchmark"
        );

        let mut summary = BenchmarkSummary::default();
        for path in images {
            let outcomes = self.benchmark_file(&path)?;
            summary.images += 1;
            let written = outcomes.iter().filter(|o| o.is_success()).count();
            summary.records_written += written;
            summary.failed_iterations += outcomes.len() - written;
        }

        info!(
            images = summary.images,
            records = summary.records_written,
            failures = summary.failed_iterations,
            "Benchmark complete"
        );
        Ok(summary)
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BenchmarkConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
