//! Color-space conversion used by the watermark embedder.

mod ycbcr;

pub use ycbcr::{luma, rgb, ColorSpaceConverter, YCbCrBuffer};
