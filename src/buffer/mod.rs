//! In-memory image buffers.
//!
//! The core never decodes or encodes image files. It receives a
//! [`PixelBuffer`] from the caller, widens it to a [`FloatBuffer`] inside
//! each stage, and narrows back to 8-bit before handing the result on.

mod float;
mod pixel;

pub use float::{FloatBuffer, SNAP_TOLERANCE};
pub use pixel::PixelBuffer;
pub(crate) use pixel::sample_count;
