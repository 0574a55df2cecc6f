//! Decoded image types

use std::fmt;

use crate::pipeline::common::error::{BenchError, Result};

/// Element type of a decoded image, named the way numeric array libraries spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    /// Width of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::F32 => "float32",
            DType::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Typed sample storage, row-major with channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! for_each_buffer {
    ($buffer:expr, $values:ident => $body:expr) => {
        match $buffer {
            PixelBuffer::U8($values) => $body,
            PixelBuffer::U16($values) => $body,
            PixelBuffer::U32($values) => $body,
            PixelBuffer::U64($values) => $body,
            PixelBuffer::I8($values) => $body,
            PixelBuffer::I16($values) => $body,
            PixelBuffer::I32($values) => $body,
            PixelBuffer::I64($values) => $body,
            PixelBuffer::F32($values) => $body,
            PixelBuffer::F64($values) => $body,
        }
    };
}

impl PixelBuffer {
    pub fn dtype(&self) -> DType {
        match self {
            PixelBuffer::U8(_) => DType::U8,
            PixelBuffer::U16(_) => DType::U16,
            PixelBuffer::U32(_) => DType::U32,
            PixelBuffer::U64(_) => DType::U64,
            PixelBuffer::I8(_) => DType::I8,
            PixelBuffer::I16(_) => DType::I16,
            PixelBuffer::I32(_) => DType::I32,
            PixelBuffer::I64(_) => DType::I64,
            PixelBuffer::F32(_) => DType::F32,
            PixelBuffer::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        for_each_buffer!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples exactly as laid out in memory (native endianness, no header).
    pub fn raw_bytes(&self) -> &[u8] {
        for_each_buffer!(self, values => bytemuck::cast_slice(values.as_slice()))
    }

    /// Widens every sample to `f64`. 64-bit integers above 2^53 lose precision.
    pub fn to_f64(&self) -> Vec<f64> {
        for_each_buffer!(self, values => values.iter().map(|&v| v as f64).collect())
    }

    /// Replaces every sample with the matching entry of `values`.
    ///
    /// Integer buffers round to nearest and saturate at the type's range.
    pub fn overwrite_from_f64(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.len() {
            return Err(BenchError::ShapeMismatch {
                expected: self.len(),
                found: values.len(),
            });
        }

        match self {
            PixelBuffer::F32(out) => {
                for (o, &v) in out.iter_mut().zip(values) {
                    *o = v as f32;
                }
            }
            PixelBuffer::F64(out) => out.copy_from_slice(values),
            // float -> int `as` casts saturate and map NaN to zero
            PixelBuffer::U8(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as u8),
            PixelBuffer::U16(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as u16),
            PixelBuffer::U32(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as u32),
            PixelBuffer::U64(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as u64),
            PixelBuffer::I8(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as i8),
            PixelBuffer::I16(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as i16),
            PixelBuffer::I32(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as i32),
            PixelBuffer::I64(out) => out.iter_mut().zip(values).for_each(|(o, &v)| *o = v.round() as i64),
        }
        Ok(())
    }
}

/// A decoded image. Read-only once loaded; drivers discard it after the file is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Samples per pixel (1 for grayscale)
    pub channels: usize,
    pub pixels: PixelBuffer,
}

impl ImageData {
    pub fn new(width: usize, height: usize, channels: usize, pixels: PixelBuffer) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BenchError::InvalidDimensions(width, height));
        }
        if width * height * channels != pixels.len() {
            return Err(BenchError::DecodeError(format!(
                "{}x{}x{} image cannot hold {} samples",
                width,
                height,
                channels,
                pixels.len()
            )));
        }
        Ok(Self { width, height, channels, pixels })
    }

    pub fn dtype(&self) -> DType {
        self.pixels.dtype()
    }

    /// Samples per row once channels are interleaved.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn raw_bytes(&self) -> &[u8] {
        self.pixels.raw_bytes()
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len() * self.dtype().size_of()
    }
}
