//! Error-bounded prediction + linear quantization.
//!
//! Each sample is predicted from already-reconstructed neighbours, and the
//! residual is quantized with a step of twice the absolute bound. Samples
//! whose residual cannot be represented within the bound are stored
//! verbatim. The code stream is zig-zag varints, deflated.
//!
//! Stream layout (little endian):
//!
//! ```text
//! "PQ" | scheme u8 | rows u64 | cols u64 | step f64 | deflate(codes)
//! ```

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use thiserror::Error;

const MAGIC: [u8; 2] = *b"PQ";
const HEADER_LEN: usize = 2 + 1 + 8 + 8 + 8;
const BLOCK: usize = 4;
/// Quantization codes beyond this magnitude are escaped to raw samples.
const MAX_CODE: f64 = (1u64 << 40) as f64;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("stream too short")]
    Truncated,

    #[error("bad stream header")]
    BadHeader,

    #[error("corrupt code stream")]
    Corrupt,

    #[error("stream was written by scheme {found}, expected {expected}")]
    SchemeMismatch { expected: u8, found: u8 },

    #[error("stream holds {found} samples, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("entropy stage failed: {0}")]
    Entropy(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// 2-D Lorenzo predictor
    Lorenzo = 1,
    /// 4x4 blocks predicted from their quantized mean
    Block = 2,
}

impl Scheme {
    fn id(self) -> u8 {
        self as u8
    }
}

enum Code {
    Quant(i64),
    Raw(f64),
}

/// Quantizes `x` against `pred`, or `None` when it has to be stored raw.
fn quantize(x: f64, pred: f64, step: f64) -> Option<(i64, f64)> {
    if !x.is_finite() || !pred.is_finite() || !step.is_finite() {
        return None;
    }
    let q = ((x - pred) / step).round();
    if !q.is_finite() || q.abs() > MAX_CODE {
        return None;
    }
    let recon = pred + q * step;
    // rounding in the reconstruction can push a sample just past the bound
    if !recon.is_finite() || (recon - x).abs() > step / 2.0 {
        return None;
    }
    Some((q as i64, recon))
}

fn dequantize(code: &Code, pred: f64, step: f64) -> f64 {
    match *code {
        Code::Quant(q) => pred + q as f64 * step,
        Code::Raw(v) => v,
    }
}

fn lorenzo_predict(recon: &[f64], row: usize, col: usize, cols: usize) -> f64 {
    let i = row * cols + col;
    match (row, col) {
        (0, 0) => 0.0,
        (0, _) => recon[i - 1],
        (_, 0) => recon[i - cols],
        _ => recon[i - 1] + recon[i - cols] - recon[i - cols - 1],
    }
}

/// Sample indices of each 4x4 block, clipped at the grid edges.
fn blocks(rows: usize, cols: usize) -> impl Iterator<Item = Vec<usize>> {
    (0..rows).step_by(BLOCK).flat_map(move |br| {
        (0..cols).step_by(BLOCK).map(move |bc| {
            let mut cells = Vec::with_capacity(BLOCK * BLOCK);
            for r in br..(br + BLOCK).min(rows) {
                for c in bc..(bc + BLOCK).min(cols) {
                    cells.push(r * cols + c);
                }
            }
            cells
        })
    })
}

struct CodeWriter {
    buf: Vec<u8>,
}

impl CodeWriter {
    fn push(&mut self, code: Option<(i64, f64)>, raw: f64) -> f64 {
        match code {
            Some((q, recon)) => {
                // zero is reserved for the raw escape
                self.push_varint(zigzag(q) + 1);
                recon
            }
            None => {
                self.push_varint(0);
                self.buf.extend_from_slice(&raw.to_le_bytes());
                raw
            }
        }
    }

    fn push_varint(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v as u8) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }
}

struct CodeReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl CodeReader<'_> {
    fn read_code(&mut self) -> Result<Code, StreamError> {
        let v = self.varint()?;
        if v == 0 {
            let bytes = self.buf.get(self.pos..self.pos + 8).ok_or(StreamError::Truncated)?;
            self.pos += 8;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok(Code::Raw(f64::from_le_bytes(raw)))
        } else {
            Ok(Code::Quant(unzigzag(v - 1)))
        }
    }

    fn varint(&mut self) -> Result<u64, StreamError> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = *self.buf.get(self.pos).ok_or(StreamError::Truncated)?;
            self.pos += 1;
            if shift >= 64 {
                return Err(StreamError::Corrupt);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Compresses a `rows` x `cols` grid so every finite sample decodes within `abs_bound`.
pub fn encode(
    values: &[f64],
    rows: usize,
    cols: usize,
    abs_bound: f64,
    scheme: Scheme,
) -> Result<Vec<u8>, StreamError> {
    if rows * cols != values.len() {
        return Err(StreamError::LengthMismatch { expected: rows * cols, found: values.len() });
    }
    let step = 2.0 * abs_bound;
    let mut codes = CodeWriter { buf: Vec::with_capacity(values.len()) };

    match scheme {
        Scheme::Lorenzo => {
            let mut recon = vec![0.0; values.len()];
            for row in 0..rows {
                for col in 0..cols {
                    let i = row * cols + col;
                    let pred = lorenzo_predict(&recon, row, col, cols);
                    recon[i] = codes.push(quantize(values[i], pred, step), values[i]);
                }
            }
        }
        Scheme::Block => {
            for cells in blocks(rows, cols) {
                let finite: Vec<f64> = cells.iter().map(|&i| values[i]).filter(|v| v.is_finite()).collect();
                let mean = if finite.is_empty() {
                    0.0
                } else {
                    finite.iter().sum::<f64>() / finite.len() as f64
                };
                let mean = codes.push(quantize(mean, 0.0, step), mean);
                for &i in &cells {
                    codes.push(quantize(values[i], mean, step), values[i]);
                }
            }
        }
    }

    let mut out = Vec::with_capacity(HEADER_LEN + codes.buf.len() / 2);
    out.extend_from_slice(&MAGIC);
    out.push(scheme.id());
    out.extend_from_slice(&(rows as u64).to_le_bytes());
    out.extend_from_slice(&(cols as u64).to_le_bytes());
    out.extend_from_slice(&step.to_le_bytes());

    let mut encoder = DeflateEncoder::new(out, Compression::default());
    encoder.write_all(&codes.buf)?;
    Ok(encoder.finish()?)
}

/// Reverses [`encode`], checking the stream was produced by `scheme` for `expected_len` samples.
pub fn decode(stream: &[u8], scheme: Scheme, expected_len: usize) -> Result<Vec<f64>, StreamError> {
    if stream.len() < HEADER_LEN {
        return Err(StreamError::Truncated);
    }
    if stream[..2] != MAGIC {
        return Err(StreamError::BadHeader);
    }
    if stream[2] != scheme.id() {
        return Err(StreamError::SchemeMismatch { expected: scheme.id(), found: stream[2] });
    }
    let u64_at = |at: usize| {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&stream[at..at + 8]);
        bytes
    };
    let rows = u64::from_le_bytes(u64_at(3)) as usize;
    let cols = u64::from_le_bytes(u64_at(11)) as usize;
    let step = f64::from_le_bytes(u64_at(19));
    let len = rows.checked_mul(cols).ok_or(StreamError::BadHeader)?;
    if len != expected_len {
        return Err(StreamError::LengthMismatch { expected: expected_len, found: len });
    }

    let mut buf = Vec::new();
    DeflateDecoder::new(&stream[HEADER_LEN..]).read_to_end(&mut buf)?;
    let mut codes = CodeReader { buf: &buf, pos: 0 };
    let mut out = vec![0.0; len];

    match scheme {
        Scheme::Lorenzo => {
            for row in 0..rows {
                for col in 0..cols {
                    let pred = lorenzo_predict(&out, row, col, cols);
                    out[row * cols + col] = dequantize(&codes.read_code()?, pred, step);
                }
            }
        }
        Scheme::Block => {
            for cells in blocks(rows, cols) {
                let mean = dequantize(&codes.read_code()?, 0.0, step);
                for &i in &cells {
                    out[i] = dequantize(&codes.read_code()?, mean, step);
                }
            }
        }
    }

    Ok(out)
}
