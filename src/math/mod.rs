//! Mathematical utilities: least-squares solving for the amplitude step.

pub mod lsq;

pub use lsq::*;
