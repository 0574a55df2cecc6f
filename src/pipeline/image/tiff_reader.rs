//! Image reader implementation using the tiff library.
//!
//! Decodes the first page of a TIFF file into an [`ImageData`] without any
//! type conversion, so the in-memory layout matches the file's sample format.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::pipeline::common::error::{BenchError, Result};
use crate::pipeline::image::reader::ImageReader;
use crate::pipeline::image::types::{ImageData, PixelBuffer};

pub struct TiffImageReader;

impl ImageReader for TiffImageReader {
    /// Reads and decodes a TIFF image from a byte array.
    ///
    /// The channel count is inferred from the number of decoded samples,
    /// which covers grayscale, gray+alpha, RGB and RGBA layouts alike.
    fn read_image(&self, data: &[u8]) -> Result<ImageData> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| BenchError::DecodeError(e.to_string()))?;
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| BenchError::DecodeError(e.to_string()))?;
        let (width, height) = (width as usize, height as usize);

        let decoded = decoder
            .read_image()
            .map_err(|e| BenchError::DecodeError(e.to_string()))?;

        let pixels = match decoded {
            DecodingResult::U8(v) => PixelBuffer::U8(v),
            DecodingResult::U16(v) => PixelBuffer::U16(v),
            DecodingResult::U32(v) => PixelBuffer::U32(v),
            DecodingResult::U64(v) => PixelBuffer::U64(v),
            DecodingResult::I8(v) => PixelBuffer::I8(v),
            DecodingResult::I16(v) => PixelBuffer::I16(v),
            DecodingResult::I32(v) => PixelBuffer::I32(v),
            DecodingResult::I64(v) => PixelBuffer::I64(v),
            DecodingResult::F32(v) => PixelBuffer::F32(v),
            DecodingResult::F64(v) => PixelBuffer::F64(v),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(BenchError::UnsupportedFormat(
                    "TIFF sample format has no matching pixel type".to_string(),
                ));
            }
        };

        if width == 0 || height == 0 {
            return Err(BenchError::InvalidDimensions(width, height));
        }
        let channels = pixels.len() / (width * height);
        debug!(width, height, channels, dtype = %pixels.dtype(), "Decoded image");

        ImageData::new(width, height, channels, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::image::types::DType;
    use tiff::encoder::{TiffEncoder, colortype};

    fn encode_gray_f32(width: u32, height: u32, data: &[f32]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(width, height, data)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_reads_float_grayscale() {
        let data: Vec<f32> = (0..16).map(|v| v as f32 * 0.25).collect();
        let bytes = encode_gray_f32(4, 4, &data);

        let image = TiffImageReader.read_image(&bytes).unwrap();

        assert_eq!((image.width, image.height, image.channels), (4, 4, 1));
        assert_eq!(image.dtype(), DType::F32);
        assert_eq!(image.pixels, PixelBuffer::F32(data));
    }

    #[test]
    fn test_reads_rgb_as_three_channels() {
        let data: Vec<u8> = (0..2 * 3 * 3).map(|v| v as u8).collect();
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
        encoder.write_image::<colortype::RGB8>(2, 3, &data).unwrap();

        let image = TiffImageReader.read_image(buffer.get_ref()).unwrap();

        assert_eq!(image.channels, 3);
        assert_eq!(image.row_len(), 6);
        assert_eq!(image.pixels, PixelBuffer::U8(data));
    }

    #[test]
    fn test_rejects_non_tiff_bytes() {
        let result = TiffImageReader.read_image(b"definitely not a tiff");

        assert!(matches!(result, Err(BenchError::DecodeError(_))));
    }
}
