//! Image decoding module
//!
//! The image-decoding collaborator: in-memory pixel types plus the reader
//! trait and its TIFF implementation.

mod reader;
mod tiff_reader;
pub mod types;

pub use reader::ImageReader;
pub use tiff_reader::TiffImageReader;
pub use types::{DType, ImageData, PixelBuffer};
