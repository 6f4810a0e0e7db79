//! Row-block split and ordered reassembly.

use crate::buffer::FloatBuffer;
use crate::error::ShapeError;

/// A contiguous horizontal slice of the image, the unit of parallel work.
#[derive(Debug, Clone)]
pub struct FrequencyBlock {
    index: usize,
    start_row: usize,
    data: FloatBuffer,
}

impl FrequencyBlock {
    /// Position of the block in the original split.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// First image row covered by the block.
    #[inline]
    pub fn start_row(&self) -> usize {
        self.start_row
    }

    /// Rows in this block.
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.height()
    }

    /// Block samples.
    #[inline]
    pub fn data(&self) -> &FloatBuffer {
        &self.data
    }

    /// Mutable block samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut FloatBuffer {
        &mut self.data
    }
}

/// Splits `buffer` into `workers` row-blocks.
///
/// Every block gets `height / workers` rows and the last one also takes
/// the remainder. When the image has fewer rows than workers, each row
/// becomes its own block.
pub fn split_rows(buffer: &FloatBuffer, workers: usize) -> Vec<FrequencyBlock> {
    let (height, width, channels) = buffer.shape();
    let count = workers.clamp(1, height.max(1));
    let block_rows = height / count;
    let row_len = width * channels;

    (0..count)
        .map(|index| {
            let start_row = index * block_rows;
            let end_row = if index + 1 == count {
                height
            } else {
                start_row + block_rows
            };
            let samples = buffer.as_slice()[start_row * row_len..end_row * row_len].to_vec();
            FrequencyBlock {
                index,
                start_row,
                data: FloatBuffer::from_parts(samples, end_row - start_row, width, channels),
            }
        })
        .collect()
}

/// Concatenates blocks vertically in original index order.
///
/// The order blocks arrive in is irrelevant; they are sorted by index
/// and checked to tile the image exactly.
pub fn reassemble(
    mut blocks: Vec<FrequencyBlock>,
    height: usize,
    width: usize,
    channels: usize,
) -> Result<FloatBuffer, ShapeError> {
    blocks.sort_by_key(|b| b.index);

    let mut data = Vec::with_capacity(height * width * channels);
    let mut next_row = 0;
    for block in blocks {
        let (rows, block_width, block_channels) = block.data.shape();
        if block.start_row != next_row || block_width != width {
            return Err(ShapeError::Mismatch {
                expected_height: next_row,
                expected_width: width,
                actual_height: block.start_row,
                actual_width: block_width,
            });
        }
        if block_channels != channels {
            return Err(ShapeError::ChannelMismatch {
                expected: channels,
                actual: block_channels,
            });
        }
        data.extend_from_slice(block.data.as_slice());
        next_row += rows;
    }

    if next_row != height {
        return Err(ShapeError::Mismatch {
            expected_height: height,
            expected_width: width,
            actual_height: next_row,
            actual_width: width,
        });
    }

    Ok(FloatBuffer::from_parts(data, height, width, channels))
}
