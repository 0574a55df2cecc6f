use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("unknown compressor: {0}")]
    UnknownCompressor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample count mismatch: expected {expected}, got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Compressor {compressor} failed: {message}")]
    CompressorError { compressor: String, message: String },

    #[error("Failed to write report: {0}")]
    ReportWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BenchError {
    pub fn compressor(compressor: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::CompressorError {
            compressor: compressor.into(),
            message: message.into(),
        }
    }

    /// Configuration errors abort the rest of a sweep regardless of failure policy.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BenchError::UnknownCompressor(_) | BenchError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
