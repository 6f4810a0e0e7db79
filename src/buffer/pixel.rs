//! 8-bit pixel buffer handed between pipeline stages.

use super::FloatBuffer;
use crate::error::ShapeError;

/// Row-major, channel-last image of unsigned 8-bit samples.
///
/// Shape is `(height, width, channels)` with `channels` in {1, 3, 4}.
/// Every value of `u8` is a valid sample, so the [0, 255] invariant
/// holds by construction.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    height: usize,
    width: usize,
    channels: usize,
}

impl PixelBuffer {
    /// Wraps raw samples, validating the shape.
    pub fn new(
        data: Vec<u8>,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self, ShapeError> {
        let len = sample_count(height, width, channels)?;
        if data.len() != len {
            return Err(ShapeError::LengthMismatch {
                actual: data.len(),
                height,
                width,
                channels,
            });
        }
        Ok(Self {
            data,
            height,
            width,
            channels,
        })
    }

    /// Creates a buffer with every sample set to `value`.
    pub fn filled(
        height: usize,
        width: usize,
        channels: usize,
        value: u8,
    ) -> Result<Self, ShapeError> {
        let len = sample_count(height, width, channels)?;
        Ok(Self {
            data: vec![value; len],
            height,
            width,
            channels,
        })
    }

    /// Creates a buffer from a `(row, col, channel) -> sample` function.
    pub fn from_fn(
        height: usize,
        width: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> u8,
    ) -> Result<Self, ShapeError> {
        let len = sample_count(height, width, channels)?;
        let mut data = Vec::with_capacity(len);
        for row in 0..height {
            for col in 0..width {
                for ch in 0..channels {
                    data.push(f(row, col, ch));
                }
            }
        }
        Ok(Self {
            data,
            height,
            width,
            channels,
        })
    }

    /// Rows in the buffer.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Columns in the buffer.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Samples per pixel: 1, 3 or 4.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Number of channels carrying color; alpha is excluded.
    #[inline]
    pub fn color_channels(&self) -> usize {
        self.channels.min(3)
    }

    /// Number of pixels (height * width).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Raw samples in row-major, channel-last order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw samples.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer, returning the raw samples.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub(crate) fn index(&self, row: usize, col: usize, ch: usize) -> usize {
        (row * self.width + col) * self.channels + ch
    }

    /// Returns a single sample.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize, ch: usize) -> u8 {
        self.data[self.index(row, col, ch)]
    }

    /// Overwrites a single sample.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, ch: usize, value: u8) {
        let idx = self.index(row, col, ch);
        self.data[idx] = value;
    }

    /// All channels of one pixel.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> &[u8] {
        let start = self.index(row, col, 0);
        &self.data[start..start + self.channels]
    }

    /// Mutable view of one pixel.
    #[inline]
    pub fn pixel_mut(&mut self, row: usize, col: usize) -> &mut [u8] {
        let start = self.index(row, col, 0);
        let channels = self.channels;
        &mut self.data[start..start + channels]
    }

    /// Widens the samples to `f64` for noise arithmetic.
    pub fn to_float(&self) -> FloatBuffer {
        FloatBuffer::from_parts(
            self.data.iter().map(|&v| f64::from(v)).collect(),
            self.height,
            self.width,
            self.channels,
        )
    }

    /// Checks that `other` has the same height and width.
    pub fn ensure_same_dimensions(&self, height: usize, width: usize) -> Result<(), ShapeError> {
        if self.height != height || self.width != width {
            return Err(ShapeError::Mismatch {
                expected_height: self.height,
                expected_width: self.width,
                actual_height: height,
                actual_width: width,
            });
        }
        Ok(())
    }

    /// Checks that `other` has exactly the same shape.
    pub fn ensure_same_shape(&self, other: &PixelBuffer) -> Result<(), ShapeError> {
        self.ensure_same_dimensions(other.height, other.width)?;
        if self.channels != other.channels {
            return Err(ShapeError::ChannelMismatch {
                expected: self.channels,
                actual: other.channels,
            });
        }
        Ok(())
    }
}

/// Validates a shape and returns its sample count.
///
/// The count must fit in `usize` and in an allocation, so `isize::MAX`
/// caps it.
pub(crate) fn sample_count(height: usize, width: usize, channels: usize) -> Result<usize, ShapeError> {
    if height == 0 || width == 0 {
        return Err(ShapeError::Empty { height, width });
    }
    if !matches!(channels, 1 | 3 | 4) {
        return Err(ShapeError::UnsupportedChannels(channels));
    }
    height
        .checked_mul(width)
        .and_then(|pixels| pixels.checked_mul(channels))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(ShapeError::TooLarge {
            height,
            width,
            channels,
        })
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}
