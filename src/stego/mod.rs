//! Steganographic marking.
//!
//! - [`WatermarkEmbedder`]: one bit per pixel in the luma LSB.
//! - [`LatticeMarker`]: sparse XOR of a byte payload on a diagonal
//!   lattice, used for hidden tokens and content identifiers.

mod lattice;
mod plane;
mod watermark;

pub use lattice::{LatticeMarker, HIDDEN_TOKEN_STRIDE, IDENTIFIER_STRIDE};
pub use plane::WatermarkPlane;
pub use watermark::WatermarkEmbedder;
