//! Reporting utilities: formatted terminal output for run summaries.

pub mod format;

pub use format::*;
