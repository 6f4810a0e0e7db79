//! Separable orthonormal 2D DCT-II and its inverse.
//!
//! `rustdct` computes unnormalized transforms: DCT-II as
//! `X[k] = Σ x[n]·cos(π(2n+1)k / 2N)` and DCT-III as
//! `x[n] = X[0]/2 + Σ_{k≥1} X[k]·cos(π(2n+1)k / 2N)`. The scale factors
//! below turn the pair into the orthonormal transform, so coefficients
//! keep the energy of the samples and noise amplitudes mean the same
//! thing for every block size.

use rustdct::{Dct2, Dct3, DctPlanner, TransformType2And3};
use std::sync::Arc;

/// Planned transforms for one `height x width` plane.
pub struct Dct2d {
    height: usize,
    width: usize,
    along_rows: Arc<dyn TransformType2And3<f64>>,
    along_cols: Arc<dyn TransformType2And3<f64>>,
}

impl Dct2d {
    /// Plans a `height x width` transform.
    pub fn new(planner: &mut DctPlanner<f64>, height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            along_rows: planner.plan_dct2(width),
            along_cols: planner.plan_dct2(height),
        }
    }

    /// Forward transform of a row-major plane, in place.
    pub fn forward(&self, plane: &mut [f64]) {
        debug_assert_eq!(plane.len(), self.height * self.width);
        for row in plane.chunks_exact_mut(self.width) {
            self.along_rows.process_dct2(row);
            scale_forward(row);
        }
        self.each_column(plane, |col| {
            self.along_cols.process_dct2(col);
            scale_forward(col);
        });
    }

    /// Inverse transform of a row-major coefficient plane, in place.
    pub fn inverse(&self, plane: &mut [f64]) {
        debug_assert_eq!(plane.len(), self.height * self.width);
        self.each_column(plane, |col| {
            scale_inverse(col);
            self.along_cols.process_dct3(col);
        });
        for row in plane.chunks_exact_mut(self.width) {
            scale_inverse(row);
            self.along_rows.process_dct3(row);
        }
    }

    fn each_column(&self, plane: &mut [f64], mut f: impl FnMut(&mut [f64])) {
        let mut column = vec![0.0; self.height];
        for c in 0..self.width {
            for (r, slot) in column.iter_mut().enumerate() {
                *slot = plane[r * self.width + c];
            }
            f(&mut column);
            for (r, &value) in column.iter().enumerate() {
                plane[r * self.width + c] = value;
            }
        }
    }
}

fn scale_forward(buf: &mut [f64]) {
    let n = buf.len() as f64;
    let dc = (1.0 / n).sqrt();
    let ac = (2.0 / n).sqrt();
    buf[0] *= dc;
    for v in &mut buf[1..] {
        *v *= ac;
    }
}

fn scale_inverse(buf: &mut [f64]) {
    let n = buf.len() as f64;
    // DCT-III halves X[0], hence the extra factor of two on the DC term.
    let dc = 2.0 * (1.0 / n).sqrt();
    let ac = (2.0 / n).sqrt();
    buf[0] *= dc;
    for v in &mut buf[1..] {
        *v *= ac;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_rectangular() {
        let mut planner = DctPlanner::new();
        let dct = Dct2d::new(&mut planner, 5, 12);
        let original: Vec<f64> = (0..60).map(|i| ((i * 37) % 256) as f64).collect();

        let mut plane = original.clone();
        dct.forward(&mut plane);
        dct.inverse(&mut plane);

        for (a, b) in original.iter().zip(&plane) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn test_constant_plane_is_pure_dc() {
        let mut planner = DctPlanner::new();
        let dct = Dct2d::new(&mut planner, 4, 4);
        let mut plane = vec![10.0; 16];

        dct.forward(&mut plane);

        // Orthonormal DC of a constant c over N samples is c * sqrt(N).
        assert!((plane[0] - 40.0).abs() < 1e-9);
        assert!(plane[1..].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_energy_preserved() {
        let mut planner = DctPlanner::new();
        let dct = Dct2d::new(&mut planner, 8, 6);
        let mut plane: Vec<f64> = (0..48).map(|i| (i as f64 * 0.7).sin() * 50.0).collect();
        let energy: f64 = plane.iter().map(|v| v * v).sum();

        dct.forward(&mut plane);
        let transformed: f64 = plane.iter().map(|v| v * v).sum();

        assert!((energy - transformed).abs() < 1e-6 * energy);
    }

    #[test]
    fn test_single_row_block() {
        let mut planner = DctPlanner::new();
        let dct = Dct2d::new(&mut planner, 1, 7);
        let original = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];

        let mut plane = original.clone();
        dct.forward(&mut plane);
        dct.inverse(&mut plane);

        for (a, b) in original.iter().zip(&plane) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
