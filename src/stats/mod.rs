//! Bootstrap summary statistics.
//!
//! One generic reduction — median plus percentile bounds over the iteration
//! axis — reused for every result type (curves, half-max contrasts,
//! semisaturation, peak positions, residuals).

pub mod aggregate;

pub use aggregate::*;
