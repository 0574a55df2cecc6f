use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::pipeline::{
    common::{error::{BenchError, Result}, scan::scan_directory},
    config::RawConversionConfig,
    image::{ImageReader, TiffImageReader},
};

#[derive(Debug, Default)]
pub struct RawConversionSummary {
    /// Files written, in processing order
    pub written: Vec<PathBuf>,
    pub bytes_written: usize,
}

/// Dumps each image's decoded samples, unmodified, next to the source file.
///
/// The output has no header and no declared byte order; consumers must know
/// the source dtype and shape. Any read or decode failure stops the run.
pub struct ImageToRawPipeline<R: ImageReader> {
    reader: R,
    config: RawConversionConfig,
}

impl ImageToRawPipeline<TiffImageReader> {
    pub fn new(config: RawConversionConfig) -> Self {
        Self {
            reader: TiffImageReader,
            config,
        }
    }
}

impl<R: ImageReader> ImageToRawPipeline<R> {
    pub fn with_custom(reader: R, config: RawConversionConfig) -> Self {
        Self { reader, config }
    }

    /// `<input path><suffix>`, e.g. `frame.tif` -> `frame.tif.f32`.
    pub fn output_path_for(&self, input_path: &Path) -> PathBuf {
        let mut name = OsString::from(input_path.as_os_str());
        name.push(&self.config.output_suffix);
        PathBuf::from(name)
    }

    /// Decodes `input_data` and writes its sample bytes to `output`, returning the byte count.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<usize> {
        let image = {
            let _span = tracing::info_span!("decode_image").entered();
            self.reader.read_image(input_data)?
        };

        let bytes = image.raw_bytes();
        {
            let _span = tracing::info_span!("write_raw", bytes = bytes.len()).entered();
            output.write_all(bytes)?;
        }

        info!(
            width = image.width,
            height = image.height,
            dtype = %image.dtype(),
            "Conversion complete"
        );
        Ok(bytes.len())
    }

    /// Converts one file, overwriting any previous output. Returns the output path and byte count.
    #[instrument(skip(self, input_path))]
    pub fn convert_file<P: AsRef<Path>>(&self, input_path: P) -> Result<(PathBuf, usize)> {
        let input_path = input_path.as_ref();
        let output_path = self.output_path_for(input_path);

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                BenchError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        // decode before truncating any existing output
        let mut buffer = Vec::new();
        let written = self.convert(&input_data, &mut buffer)?;

        {
            let _span = tracing::info_span!("write_output_file").entered();
            std::fs::write(&output_path, &buffer).map_err(|e| {
                BenchError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
        }

        Ok((output_path, written))
    }

    /// Converts every matching image in the input directory.
    pub fn run(&self) -> Result<RawConversionSummary> {
        let images = scan_directory(&self.config.input_dir, &self.config.extension)?;
        info!(
            dir = %self.config.input_dir.display(),
            count = images.len(),
            "Converting images to raw"
        );

        let mut summary = RawConversionSummary::default();
        for path in images {
            let (output, bytes) = self.convert_file(&path)?;
            summary.written.push(output);
            summary.bytes_written += bytes;
        }
        Ok(summary)
    }

    pub fn config(&self) -> &RawConversionConfig {
        &self.config
    }
}
