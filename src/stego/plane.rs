//! Binary watermark planes.

use crate::buffer::sample_count;
use crate::error::ShapeError;
use serde::{Deserialize, Serialize};

/// A `height x width` array of single bits, stored one per byte.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlaneRepr", into = "PlaneRepr")]
pub struct WatermarkPlane {
    bits: Vec<u8>,
    height: usize,
    width: usize,
}

impl WatermarkPlane {
    /// Wraps a row-major bit array; every value must be 0 or 1.
    pub fn new(bits: Vec<u8>, height: usize, width: usize) -> Result<Self, ShapeError> {
        if bits.len() != sample_count(height, width, 1)? {
            return Err(ShapeError::LengthMismatch {
                actual: bits.len(),
                height,
                width,
                channels: 1,
            });
        }
        if let Some(pos) = bits.iter().position(|&b| b > 1) {
            return Err(ShapeError::NotABit {
                row: pos / width,
                col: pos % width,
                value: bits[pos],
            });
        }
        Ok(Self {
            bits,
            height,
            width,
        })
    }

    /// Builds a plane from a `(row, col) -> bit` function.
    pub fn from_fn(
        height: usize,
        width: usize,
        mut f: impl FnMut(usize, usize) -> bool,
    ) -> Result<Self, ShapeError> {
        let mut bits = Vec::with_capacity(sample_count(height, width, 1)?);
        for row in 0..height {
            for col in 0..width {
                bits.push(u8::from(f(row, col)));
            }
        }
        Self::new(bits, height, width)
    }

    /// Tiles the UTF-8 bits of `text` row-major, most significant bit first.
    pub fn from_text(text: &str, height: usize, width: usize) -> Result<Self, ShapeError> {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return Self::from_fn(height, width, |_, _| false);
        }
        let total_bits = bytes.len() * 8;
        Self::from_fn(height, width, |row, col| {
            let i = (row * width + col) % total_bits;
            (bytes[i / 8] >> (7 - i % 8)) & 1 == 1
        })
    }

    /// Rows in the plane.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Columns in the plane.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Payload capacity in bits.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.bits[row * self.width + col]
    }

    /// Bits in row-major order.
    #[inline]
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }
}

impl std::fmt::Debug for WatermarkPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkPlane")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("ones", &self.count_ones())
            .finish()
    }
}

/// Serialized form; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct PlaneRepr {
    height: usize,
    width: usize,
    bits: Vec<u8>,
}

impl TryFrom<PlaneRepr> for WatermarkPlane {
    type Error = ShapeError;

    fn try_from(repr: PlaneRepr) -> Result<Self, Self::Error> {
        Self::new(repr.bits, repr.height, repr.width)
    }
}

impl From<WatermarkPlane> for PlaneRepr {
    fn from(plane: WatermarkPlane) -> Self {
        Self {
            height: plane.height,
            width: plane.width,
            bits: plane.bits,
        }
    }
}
