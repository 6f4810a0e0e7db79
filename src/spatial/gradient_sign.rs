//! Minimal gradient-sign perturbation.
//!
//! Adds `epsilon` to every sample whose local gradient is non-zero, a
//! tiny nudge along textured regions that leaves flat areas alone.

use crate::buffer::PixelBuffer;
use crate::config::check_amplitude;
use crate::error::Result;

const STAGE: &str = "gradient-sign";

/// Gradient-sign noise, computed independently per channel.
#[derive(Debug, Clone, Copy)]
pub struct GradientSignNoise {
    epsilon: f64,
}

impl Default for GradientSignNoise {
    fn default() -> Self {
        Self { epsilon: 1.0 }
    }
}

impl GradientSignNoise {
    /// Creates a perturbation stepping by `epsilon`.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Returns a copy of `buffer` with `epsilon` added wherever the gradient is non-zero.
    pub fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        check_amplitude("epsilon", self.epsilon)?;
        let mut work = buffer.to_float();
        let (height, width, channels) = buffer.shape();

        let mut touched = 0usize;
        for ch in 0..channels {
            let plane = work.channel_plane(ch);
            let mut out = plane.clone();
            for row in 0..height {
                for col in 0..width {
                    let dy = central_difference(&plane, width, height, row, col, Axis::Rows);
                    let dx = central_difference(&plane, width, width, row, col, Axis::Cols);
                    if dx.hypot(dy) > 0.0 {
                        out[row * width + col] += self.epsilon;
                        touched += 1;
                    }
                }
            }
            work.write_channel_plane(ch, &out);
        }

        tracing::debug!(epsilon = self.epsilon, touched, "Applied gradient-sign noise");
        work.narrow_truncating(STAGE)
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Cols,
}

/// Central differences inside, one-sided at the borders.
fn central_difference(
    plane: &[f64],
    width: usize,
    len: usize,
    row: usize,
    col: usize,
    axis: Axis,
) -> f64 {
    if len < 2 {
        return 0.0;
    }
    let value = |i: usize| match axis {
        Axis::Rows => plane[i * width + col],
        Axis::Cols => plane[row * width + i],
    };
    let i = match axis {
        Axis::Rows => row,
        Axis::Cols => col,
    };
    if i == 0 {
        value(1) - value(0)
    } else if i == len - 1 {
        value(i) - value(i - 1)
    } else {
        (value(i + 1) - value(i - 1)) / 2.0
    }
}
