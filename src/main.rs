use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use pictoral_rs::logger;
use pictoral_rs::pipeline::{
    BenchmarkConfig, BenchmarkPipeline, BoundMode, FailurePolicy, ImageToRawPipeline,
    RawConversionConfig,
    config::{DEFAULT_BOUNDS, DEFAULT_COMPRESSORS, DEFAULT_EXTENSION, DEFAULT_INPUT_DIR, DEFAULT_REPORT},
};

use tracing::info;

#[derive(Parser)]
#[command(
    name = "pictoral",
    about = "Convert scientific TIFF images to raw samples and benchmark lossy compressors against them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write each image's decoded samples to `<image>.f32`
    ToRaw {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Sweep compressors and error bounds over each image, appending metrics to a CSV report
    Bench {
        #[command(flatten)]
        input: InputArgs,
        /// CSV report to append to (header written only when the file is new)
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: PathBuf,
        /// Compressor to run; repeat for several
        #[arg(short, long = "compressor", default_values_t = DEFAULT_COMPRESSORS.map(String::from))]
        compressors: Vec<String>,
        /// Error bound to run; repeat for several
        #[arg(short, long = "bound", default_values_t = DEFAULT_BOUNDS)]
        bounds: Vec<f64>,
        /// Treat bounds as a fraction of each image's value range
        #[arg(long)]
        relative: bool,
        /// Skip the rest of an image's sweep after the first failure
        #[arg(long)]
        abort_on_failure: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Directory holding the images
    #[arg(short, long, default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,
    /// Only files ending with this are processed
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    extension: String,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::ToRaw { input } => {
            let config = RawConversionConfig {
                input_dir: input.input_dir,
                extension: input.extension,
                ..Default::default()
            };
            let pipeline = ImageToRawPipeline::new(config);
            let summary = pipeline
                .run()
                .with_context(|| format!("converting images in {}", pipeline.config().input_dir.display()))?;
            info!(
                files = summary.written.len(),
                bytes = summary.bytes_written,
                "Raw conversion finished"
            );
        }
        Commands::Bench {
            input,
            output,
            compressors,
            bounds,
            relative,
            abort_on_failure,
        } => {
            let config = BenchmarkConfig::builder()
                .input_dir(input.input_dir)
                .extension(input.extension)
                .output_path(output)
                .compressors(compressors)
                .bounds(bounds)
                .bound_mode(if relative {
                    BoundMode::ValueRangeRelative
                } else {
                    BoundMode::Absolute
                })
                .failure_policy(if abort_on_failure {
                    FailurePolicy::AbortImage
                } else {
                    FailurePolicy::IsolateIteration
                })
                .build();

            let mut pipeline = BenchmarkPipeline::new(config).context("invalid benchmark configuration")?;
            info!(report = %pipeline.config().output_path.display(), "Benchmark pipeline initialized");
            pipeline.run().context("benchmark run failed")?;
        }
    }

    Ok(())
}
