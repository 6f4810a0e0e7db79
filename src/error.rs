//! Error taxonomy shared by every stage.
//!
//! Stages validate their own inputs and fail immediately. The pipeline
//! never retries: randomness differs per call, so a failed run is
//! discarded and the caller starts over from its untouched input.

use crate::config::ConfigError;
use thiserror::Error;

/// Buffer and watermark dimension errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Channel count outside {1, 3, 4}.
    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(usize),
    /// Two buffers that must agree differ in channel count.
    #[error("expected {expected} channels, got {actual}")]
    ChannelMismatch {
        /// Channels of the reference buffer.
        expected: usize,
        /// Channels of the buffer being checked.
        actual: usize,
    },
    /// Zero height or width.
    #[error("buffer dimensions must be non-zero (got {height}x{width})")]
    Empty {
        /// Requested rows.
        height: usize,
        /// Requested columns.
        width: usize,
    },
    /// Sample data does not fill the declared shape.
    #[error("sample count {actual} does not match {height}x{width}x{channels}")]
    LengthMismatch {
        /// Samples supplied.
        actual: usize,
        /// Declared rows.
        height: usize,
        /// Declared columns.
        width: usize,
        /// Declared channels.
        channels: usize,
    },
    /// The shape's sample count overflows `usize` or exceeds the
    /// largest possible allocation.
    #[error("shape {height}x{width}x{channels} is too large to allocate")]
    TooLarge {
        /// Requested rows.
        height: usize,
        /// Requested columns.
        width: usize,
        /// Requested channels.
        channels: usize,
    },
    /// Height and width differ from the reference image.
    #[error(
        "dimension mismatch: expected {expected_height}x{expected_width}, \
         got {actual_height}x{actual_width}"
    )]
    Mismatch {
        /// Rows of the reference image.
        expected_height: usize,
        /// Columns of the reference image.
        expected_width: usize,
        /// Rows supplied.
        actual_height: usize,
        /// Columns supplied.
        actual_width: usize,
    },
    /// A watermark plane holds something other than 0 or 1.
    #[error("watermark value {value} at ({row}, {col}) is not a single bit")]
    NotABit {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The entry itself.
        value: u8,
    },
}

/// Terminal error for one protection attempt.
#[derive(Debug, Clone, Error)]
pub enum ProtectError {
    /// Input or intermediate buffer has an invalid shape.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
    /// Configuration rejected before any stage ran.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A stage hit a numeric or internal fault.
    #[error("stage `{stage}` failed: {reason}")]
    StageFailure {
        /// Name of the failing stage.
        stage: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl ProtectError {
    /// Builds a [`ProtectError::StageFailure`] for the named stage.
    pub fn stage(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::StageFailure {
            stage,
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ProtectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = ProtectError::from(ShapeError::Mismatch {
            expected_height: 4,
            expected_width: 5,
            actual_height: 2,
            actual_width: 5,
        });
        assert_eq!(
            err.to_string(),
            "shape error: dimension mismatch: expected 4x5, got 2x5"
        );

        let err = ProtectError::stage("frequency-noise", "NaN coefficient");
        assert_eq!(
            err.to_string(),
            "stage `frequency-noise` failed: NaN coefficient"
        );
    }
}
