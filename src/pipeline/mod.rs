//! Stage orchestration.
//!
//! A [`Strategy`] names an ordered list of [`Stage`]s; the
//! [`ProtectionPipeline`] validates the request, derives one RNG child per
//! stage from the run seed, and threads an owned working buffer through
//! the stages:
//!
//! ```text
//! validate → watermark → adaptive → semantic → frequency → restore
//!                                                  ↓
//!                                          worker pool (rayon)
//! ```
//!
//! Any stage error aborts the run. The caller's buffer is only borrowed.

mod runner;
mod strategy;

pub use runner::{ProtectionPipeline, ProtectionReport, StageTiming};
pub use strategy::{Stage, Strategy};
