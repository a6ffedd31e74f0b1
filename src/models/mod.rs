//! Contrast response model evaluation for the power and hyperbolic-ratio
//! variants.
//!
//! The solver relies on three primitive operations:
//! - evaluate `R(c)` given parameters (for SSE/curves)
//! - evaluate the nonlinear basis `g(c)` whose amplitude is solved linearly
//! - invert the model at half of its full-contrast response

pub mod crf;

pub use crf::*;
