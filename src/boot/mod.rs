//! Bootstrapped CRF fitting.
//!
//! Responsibilities:
//!
//! - draw with-replacement subject resamples, one per iteration
//! - fan iterations out over an explicit worker budget
//! - collect per-iteration fits into pre-sized result matrices

pub mod sampler;

pub use sampler::*;
