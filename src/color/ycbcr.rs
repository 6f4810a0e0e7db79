//! RGB ↔ YCbCr (ITU-R BT.601, full range).
//!
//! Round trips are lossy: each of Y, Cb and Cr is quantized to 8 bits, so
//! `to_rgb(to_ycbcr(x))` may differ from `x` by one unit per sample. That
//! bound is accepted; it is not a defect.

use crate::buffer::PixelBuffer;
use crate::error::ShapeError;

/// Planar 8-bit YCbCr image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YCbCrBuffer {
    y: Vec<u8>,
    cb: Vec<u8>,
    cr: Vec<u8>,
    height: usize,
    width: usize,
}

impl YCbCrBuffer {
    /// Rows in each plane.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Columns in each plane.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Luma plane, row-major.
    #[inline]
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// Mutable luma plane.
    #[inline]
    pub fn y_mut(&mut self) -> &mut [u8] {
        &mut self.y
    }

    /// Blue-difference plane, row-major.
    #[inline]
    pub fn cb(&self) -> &[u8] {
        &self.cb
    }

    /// Red-difference plane, row-major.
    #[inline]
    pub fn cr(&self) -> &[u8] {
        &self.cr
    }
}

/// Converts between RGB pixel buffers and planar YCbCr.
pub struct ColorSpaceConverter;

impl ColorSpaceConverter {
    /// Converts a 3-channel RGB buffer to YCbCr.
    pub fn to_ycbcr(rgb: &PixelBuffer) -> Result<YCbCrBuffer, ShapeError> {
        if rgb.channels() != 3 {
            return Err(ShapeError::ChannelMismatch {
                expected: 3,
                actual: rgb.channels(),
            });
        }

        let count = rgb.pixel_count();
        let mut y = Vec::with_capacity(count);
        let mut cb = Vec::with_capacity(count);
        let mut cr = Vec::with_capacity(count);

        for px in rgb.as_bytes().chunks_exact(3) {
            let (r, g, b) = (px[0], px[1], px[2]);
            y.push(luma(r, g, b));
            let (u, v) = chroma(r, g, b);
            cb.push(u);
            cr.push(v);
        }

        Ok(YCbCrBuffer {
            y,
            cb,
            cr,
            height: rgb.height(),
            width: rgb.width(),
        })
    }

    /// Converts YCbCr back to a 3-channel RGB buffer.
    pub fn to_rgb(ycbcr: &YCbCrBuffer) -> Result<PixelBuffer, ShapeError> {
        let mut data = Vec::with_capacity(ycbcr.y.len() * 3);
        for ((&y, &cb), &cr) in ycbcr.y.iter().zip(&ycbcr.cb).zip(&ycbcr.cr) {
            data.extend_from_slice(&rgb(y, cb, cr));
        }
        PixelBuffer::new(data, ycbcr.height, ycbcr.width, 3)
    }
}

/// Integer BT.601 luma.
///
/// Weights sum to exactly 1000, so adding one to each of R, G and B adds
/// exactly one to the result.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

#[inline]
fn chroma(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (quantize(cb), quantize(cr))
}

/// Converts one YCbCr triple to RGB.
#[inline]
pub fn rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = f64::from(y);
    let cb = f64::from(cb) - 128.0;
    let cr = f64::from(cr) - 128.0;
    [
        quantize(y + 1.402 * cr),
        quantize(y - 0.344_136 * cb - 0.714_136 * cr),
        quantize(y + 1.772 * cb),
    ]
}

#[inline]
fn quantize(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primaries() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
        assert_eq!(chroma(128, 128, 128), (128, 128));
    }

    #[test]
    fn test_uniform_shift_moves_luma_by_one() {
        for (r, g, b) in [(10, 200, 37), (254, 0, 100), (77, 78, 79)] {
            assert_eq!(luma(r + 1, g + 1, b + 1), luma(r, g, b) + 1);
        }
    }

    #[test]
    fn test_roundtrip_within_one_unit() {
        let rgb_buf = PixelBuffer::from_fn(16, 16, 3, |r, c, ch| {
            ((r * 37 + c * 11 + ch * 89) % 256) as u8
        })
        .unwrap();

        let ycc = ColorSpaceConverter::to_ycbcr(&rgb_buf).unwrap();
        let back = ColorSpaceConverter::to_rgb(&ycc).unwrap();

        for (a, b) in rgb_buf.as_bytes().iter().zip(back.as_bytes()) {
            assert!(a.abs_diff(*b) <= 1, "{a} vs {b}");
        }
    }

    #[test]
    fn test_non_rgb_rejected() {
        let gray = PixelBuffer::filled(2, 2, 1, 0).unwrap();
        assert!(matches!(
            ColorSpaceConverter::to_ycbcr(&gray),
            Err(ShapeError::ChannelMismatch { expected: 3, actual: 1 })
        ));
    }
}
