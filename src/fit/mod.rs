//! Contrast-response curve fitting.
//!
//! Responsibilities:
//!
//! - generate search grids over the nonlinear shape parameters
//! - evaluate each candidate (amplitude solved in closed form, clamped)
//! - derive half-maximum contrast, semisaturation, and residuals

pub mod fitter;
pub mod param_grid;

pub use fitter::*;
pub use param_grid::*;
