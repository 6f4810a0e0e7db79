//! Sparse XOR marking on a diagonal lattice.
//!
//! Payload bytes are XORed into every channel of the pixels where
//! `(row + col) % stride == 0`, scanning row-major, until the payload
//! runs out. XOR is its own inverse: applying the same marker with the
//! same payload again restores the original samples.

use crate::buffer::PixelBuffer;

/// Stride used for the random hidden token.
pub const HIDDEN_TOKEN_STRIDE: usize = 50;

/// Stride used for the content identifier.
pub const IDENTIFIER_STRIDE: usize = 10;

/// XORs a payload into lattice samples.
#[derive(Debug, Clone, Copy)]
pub struct LatticeMarker {
    stride: usize,
}

impl LatticeMarker {
    /// Marks every pixel whose `row + col` is a multiple of `stride`; zero counts as one.
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    /// Lattice stride.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Lattice pixel coordinates in scan order.
    pub fn positions(&self, height: usize, width: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..height)
            .flat_map(move |row| (0..width).map(move |col| (row, col)))
            .filter(move |(row, col)| (row + col) % self.stride == 0)
    }

    /// Number of payload bytes the buffer can carry.
    pub fn capacity(&self, buffer: &PixelBuffer) -> usize {
        self.positions(buffer.height(), buffer.width()).count() * buffer.channels()
    }

    /// Returns a copy of `buffer` with `payload` XORed into the lattice.
    pub fn apply(&self, buffer: &PixelBuffer, payload: &[u8]) -> PixelBuffer {
        let mut out = buffer.clone();
        let mut bytes = payload.iter();

        'scan: for (row, col) in self.positions(buffer.height(), buffer.width()) {
            for sample in out.pixel_mut(row, col) {
                match bytes.next() {
                    Some(b) => *sample ^= b,
                    None => break 'scan,
                }
            }
        }

        let dropped = bytes.len();
        if dropped > 0 {
            tracing::warn!(
                stride = self.stride,
                dropped,
                "Lattice payload truncated to buffer capacity"
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelBuffer {
        PixelBuffer::from_fn(20, 20, 3, |r, c, ch| (r * 11 + c * 3 + ch) as u8).unwrap()
    }

    #[test]
    fn test_only_lattice_changes() {
        let buffer = sample();
        let marked = LatticeMarker::new(10).apply(&buffer, &[0xFF; 12]);

        // First lattice pixels are (0,0), (0,10), (1,9), (1,19).
        for (row, col) in [(0, 0), (0, 10), (1, 9), (1, 19)] {
            for ch in 0..3 {
                assert_eq!(marked.get(row, col, ch), !buffer.get(row, col, ch));
            }
        }
        assert_eq!(marked.get(0, 1, 0), buffer.get(0, 1, 0));
        assert_eq!(marked.get(2, 8, 0), buffer.get(2, 8, 0));
    }

    #[test]
    fn test_xor_is_self_inverse() {
        let buffer = sample();
        let marker = LatticeMarker::new(7);
        let payload = b"0123456789abcdef";

        let marked = marker.apply(&buffer, payload);
        assert_ne!(marked, buffer);
        assert_eq!(marker.apply(&marked, payload), buffer);
    }

    #[test]
    fn test_capacity_and_truncation() {
        let buffer = PixelBuffer::filled(2, 2, 1, 0).unwrap();
        let marker = LatticeMarker::new(2);

        // (0,0) and (1,1) only.
        assert_eq!(marker.capacity(&buffer), 2);
        let marked = marker.apply(&buffer, &[1, 2, 3]);
        assert_eq!(marked.as_bytes(), &[1, 0, 0, 2]);
    }
}
