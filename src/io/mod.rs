//! Input/output helpers.
//!
//! - bootstrap snapshot read/write (`snapshot`)
//! - per-depth summary CSV export (`export`)

pub mod export;
pub mod snapshot;

pub use export::*;
pub use snapshot::*;
