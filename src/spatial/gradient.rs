//! Gradient fields over a single intensity plane.

use crate::buffer::PixelBuffer;

/// Guards normalization when a plane is perfectly flat.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Horizontal and vertical derivatives of a plane.
#[derive(Debug, Clone)]
pub struct GradientField {
    gx: Vec<f64>,
    gy: Vec<f64>,
    height: usize,
    width: usize,
}

impl GradientField {
    /// 3x3 Sobel derivatives with replicated borders.
    pub fn sobel(plane: &[f64], height: usize, width: usize) -> Self {
        debug_assert_eq!(plane.len(), height * width);
        let at = |r: isize, c: isize| {
            let r = r.clamp(0, height as isize - 1) as usize;
            let c = c.clamp(0, width as isize - 1) as usize;
            plane[r * width + c]
        };

        let mut gx = Vec::with_capacity(plane.len());
        let mut gy = Vec::with_capacity(plane.len());
        for row in 0..height as isize {
            for col in 0..width as isize {
                let (n, s) = (row - 1, row + 1);
                let (w, e) = (col - 1, col + 1);
                gx.push(
                    (at(n, e) + 2.0 * at(row, e) + at(s, e))
                        - (at(n, w) + 2.0 * at(row, w) + at(s, w)),
                );
                gy.push(
                    (at(s, w) + 2.0 * at(s, col) + at(s, e))
                        - (at(n, w) + 2.0 * at(n, col) + at(n, e)),
                );
            }
        }

        Self {
            gx,
            gy,
            height,
            width,
        }
    }

    /// Rows of the source plane.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Columns of the source plane.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Horizontal derivative per pixel.
    #[inline]
    pub fn gx(&self) -> &[f64] {
        &self.gx
    }

    /// Vertical derivative per pixel.
    #[inline]
    pub fn gy(&self) -> &[f64] {
        &self.gy
    }

    /// Euclidean gradient magnitude per pixel.
    pub fn magnitude(&self) -> Vec<f64> {
        self.gx
            .iter()
            .zip(&self.gy)
            .map(|(x, y)| x.hypot(*y))
            .collect()
    }

    /// Magnitude divided by its maximum, in [0, 1].
    pub fn normalized_magnitude(&self) -> Vec<f64> {
        let magnitude = self.magnitude();
        let max = magnitude.iter().copied().fold(0.0, f64::max);
        magnitude
            .into_iter()
            .map(|m| m / (max + NORMALIZE_EPSILON))
            .collect()
    }
}

/// Collapses a buffer to one intensity plane.
///
/// Gray buffers are used as-is; color buffers use BT.601 luma weights
/// and ignore alpha.
pub fn intensity_plane(buffer: &PixelBuffer) -> Vec<f64> {
    if buffer.channels() == 1 {
        return buffer.as_bytes().iter().map(|&v| f64::from(v)).collect();
    }
    buffer
        .as_bytes()
        .chunks_exact(buffer.channels())
        .map(|px| 0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_plane_has_no_gradient() {
        let field = GradientField::sobel(&[50.0; 25], 5, 5);
        assert!(field.magnitude().iter().all(|&m| m == 0.0));
        assert!(field.normalized_magnitude().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_vertical_edge_is_horizontal_gradient() {
        // Left half 0, right half 100.
        let plane: Vec<f64> = (0..36).map(|i| if i % 6 >= 3 { 100.0 } else { 0.0 }).collect();
        let field = GradientField::sobel(&plane, 6, 6);

        // Column 2 sits on the step: gx = 4 * 100, gy = 0.
        assert_eq!(field.gx()[2 * 6 + 2], 400.0);
        assert_eq!(field.gy()[2 * 6 + 2], 0.0);
        // Far from the step there is nothing.
        assert_eq!(field.gx()[2 * 6], 0.0);
    }

    #[test]
    fn test_normalized_peak_is_near_one() {
        let plane: Vec<f64> = (0..16).map(|i| (i / 4) as f64 * 10.0).collect();
        let field = GradientField::sobel(&plane, 4, 4);
        let normalized = field.normalized_magnitude();

        let max = normalized.iter().copied().fold(0.0, f64::max);
        assert!(max <= 1.0);
        assert!(max > 0.999);
    }

    #[test]
    fn test_intensity_plane_uses_luma() {
        let buffer = PixelBuffer::new(vec![255, 0, 0, 9, 0, 255, 0, 9], 1, 2, 4).unwrap();
        let plane = intensity_plane(&buffer);
        assert!((plane[0] - 76.245).abs() < 1e-9);
        assert!((plane[1] - 149.685).abs() < 1e-9);
    }
}
