//! Smooth flatness mask for semantic noise.

use super::gradient::{intensity_plane, GradientField};
use crate::buffer::PixelBuffer;

/// Returns `exp(-normalized_magnitude)` per pixel.
///
/// Flat regions get 1.0; the strongest edge in the image gets about
/// `1/e`.
pub fn flatness_mask(buffer: &PixelBuffer) -> Vec<f64> {
    let plane = intensity_plane(buffer);
    GradientField::sobel(&plane, buffer.height(), buffer.width())
        .normalized_magnitude()
        .into_iter()
        .map(|m| (-m).exp())
        .collect()
}
