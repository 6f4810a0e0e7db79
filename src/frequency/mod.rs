//! Frequency-domain noise injection.
//!
//! The image is cut into horizontal row-blocks, one job per worker. Each
//! job runs an orthonormal 2D DCT per color channel, perturbs the
//! coefficients, and transforms back. Jobs share nothing; results are put
//! back together by block index, never by completion order.
//!
//! ```text
//! split_rows → [block 0] [block 1] ... [block n-1] → reassemble
//!                  ↓         ↓              ↓
//!               DCT → noise → IDCT (one worker each)
//! ```

mod block;
mod dct;
mod engine;

pub use block::{reassemble, split_rows, FrequencyBlock};
pub use dct::Dct2d;
pub use engine::{FrequencyNoiseEngine, FrequencyPerturbation};
