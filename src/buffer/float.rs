//! Floating-point working copy used for noise arithmetic.

use super::PixelBuffer;
use crate::error::{ProtectError, ShapeError};

/// `f64` samples with the same layout as a [`PixelBuffer`].
///
/// Values may leave [0, 255] while a stage works on them; [`narrow`] or
/// [`narrow_truncating`] clips them back before the data crosses a stage
/// boundary.
///
/// [`narrow`]: FloatBuffer::narrow
/// [`narrow_truncating`]: FloatBuffer::narrow_truncating
#[derive(Debug, Clone, PartialEq)]
pub struct FloatBuffer {
    data: Vec<f64>,
    height: usize,
    width: usize,
    channels: usize,
}

impl FloatBuffer {
    /// Creates an all-zero buffer.
    pub fn zeros(height: usize, width: usize, channels: usize) -> Result<Self, ShapeError> {
        let len = super::sample_count(height, width, channels)?;
        Ok(Self {
            data: vec![0.0; len],
            height,
            width,
            channels,
        })
    }

    pub(crate) fn from_parts(data: Vec<f64>, height: usize, width: usize, channels: usize) -> Self {
        debug_assert_eq!(data.len(), height * width * channels);
        Self {
            data,
            height,
            width,
            channels,
        }
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

    /// Samples per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Samples in row-major, channel-last order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the samples.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns a single sample.
    #[inline]
    pub fn get(&self, row: usize, col: usize, ch: usize) -> f64 {
        self.data[(row * self.width + col) * self.channels + ch]
    }

    /// Overwrites a single sample.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, ch: usize, value: f64) {
        let idx = (row * self.width + col) * self.channels + ch;
        self.data[idx] = value;
    }

    /// Element-wise addition of another buffer of identical shape.
    pub fn add_assign(&mut self, other: &FloatBuffer) -> Result<(), ShapeError> {
        if self.shape() != other.shape() {
            return Err(ShapeError::LengthMismatch {
                actual: other.data.len(),
                height: self.height,
                width: self.width,
                channels: self.channels,
            });
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    /// Extracts one channel as a row-major plane.
    pub fn channel_plane(&self, ch: usize) -> Vec<f64> {
        self.data
            .iter()
            .skip(ch)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Writes a row-major plane back into one channel.
    pub fn write_channel_plane(&mut self, ch: usize, plane: &[f64]) {
        debug_assert_eq!(plane.len(), self.height * self.width);
        for (slot, &value) in self
            .data
            .iter_mut()
            .skip(ch)
            .step_by(self.channels)
            .zip(plane)
        {
            *slot = value;
        }
    }

    /// Clamps every sample into [0, 255].
    pub fn clip(&mut self) {
        for v in &mut self.data {
            *v = v.clamp(0.0, 255.0);
        }
    }

    /// Clips, rounds and narrows to 8-bit.
    ///
    /// Used where an unchanged buffer must come back byte for byte, as in
    /// statistics restoration. Fails with a stage failure if any sample is
    /// NaN or infinite, so a numeric fault never turns silently into a
    /// black or white pixel.
    pub fn narrow(&self, stage: &'static str) -> Result<PixelBuffer, ProtectError> {
        self.narrow_with(stage, f64::round)
    }

    /// Clips and narrows to 8-bit, truncating toward zero.
    ///
    /// Noise stages narrow this way, so any negative perturbation drops a
    /// sample by one step and sub-unit noise still reaches the output.
    /// Samples within [`SNAP_TOLERANCE`] of a whole number count as that
    /// number, which keeps transform round-off from registering as noise.
    /// Fails on NaN or infinite samples like [`narrow`](Self::narrow).
    pub fn narrow_truncating(&self, stage: &'static str) -> Result<PixelBuffer, ProtectError> {
        self.narrow_with(stage, |v| {
            let nearest = v.round();
            if (v - nearest).abs() <= SNAP_TOLERANCE {
                nearest
            } else {
                v.trunc()
            }
        })
    }

    fn narrow_with(
        &self,
        stage: &'static str,
        to_integer: impl Fn(f64) -> f64,
    ) -> Result<PixelBuffer, ProtectError> {
        let mut bytes = Vec::with_capacity(self.data.len());
        for (i, &v) in self.data.iter().enumerate() {
            if !v.is_finite() {
                return Err(ProtectError::stage(
                    stage,
                    format!("non-finite sample {v} at element {i}"),
                ));
            }
            bytes.push(to_integer(v.clamp(0.0, 255.0)) as u8);
        }
        Ok(PixelBuffer::new(bytes, self.height, self.width, self.channels)?)
    }
}

/// Distance from a whole number below which [`FloatBuffer::narrow_truncating`]
/// treats a sample as exact.
pub const SNAP_TOLERANCE: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_clips_and_rounds() {
        let buffer = FloatBuffer::from_parts(vec![-12.0, 0.4, 127.5, 300.0], 2, 2, 1);
        let pixels = buffer.narrow("test").unwrap();

        assert_eq!(pixels.as_bytes(), &[0, 0, 128, 255]);
    }

    #[test]
    fn test_narrow_truncating_drops_fractions() {
        let buffer = FloatBuffer::from_parts(
            vec![-0.5, 0.4, 127.9, 128.000_000_000_1, 127.999_999_999_9, 300.0],
            1,
            2,
            3,
        );
        let pixels = buffer.narrow_truncating("test").unwrap();

        assert_eq!(pixels.as_bytes(), &[0, 0, 127, 128, 128, 255]);
    }

    #[test]
    fn test_narrow_truncating_rejects_infinity() {
        let buffer = FloatBuffer::from_parts(vec![f64::INFINITY], 1, 1, 1);
        assert!(matches!(
            buffer.narrow_truncating("test"),
            Err(ProtectError::StageFailure { stage: "test", .. })
        ));
    }

    #[test]
    fn test_narrow_rejects_nan() {
        let buffer = FloatBuffer::from_parts(vec![1.0, f64::NAN, 3.0], 1, 1, 3);
        assert!(matches!(
            buffer.narrow("test"),
            Err(ProtectError::StageFailure { stage: "test", .. })
        ));
    }

    #[test]
    fn test_channel_plane_roundtrip() {
        let pixels = PixelBuffer::from_fn(2, 2, 3, |r, c, ch| (r * 30 + c * 10 + ch) as u8).unwrap();
        let mut buffer = pixels.to_float();

        let green = buffer.channel_plane(1);
        assert_eq!(green, vec![1.0, 11.0, 31.0, 41.0]);

        buffer.write_channel_plane(1, &[0.0; 4]);
        assert_eq!(buffer.get(1, 1, 1), 0.0);
        assert_eq!(buffer.get(1, 1, 2), 42.0);
    }

    #[test]
    fn test_add_assign_shape_checked() {
        let mut a = FloatBuffer::zeros(2, 2, 1).unwrap();
        let b = FloatBuffer::zeros(2, 2, 3).unwrap();
        assert!(a.add_assign(&b).is_err());
    }
}
