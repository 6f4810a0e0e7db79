//! Binary edge mask for adaptive noise.
//!
//! Artifacts are most visible along edges, so the adaptive mode keeps
//! noise out of them entirely and spends it on flat or textured areas.

use super::gradient::{intensity_plane, GradientField};
use crate::buffer::PixelBuffer;

/// Sobel magnitude above which a pixel counts as an edge.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 100.0;

/// Returns 0.0 at edge pixels and 1.0 elsewhere.
pub fn edge_mask(buffer: &PixelBuffer, threshold: f64) -> Vec<f64> {
    let plane = intensity_plane(buffer);
    GradientField::sobel(&plane, buffer.height(), buffer.width())
        .magnitude()
        .into_iter()
        .map(|m| if m > threshold { 0.0 } else { 1.0 })
        .collect()
}
