//! Input data: profile-file ingest and synthetic profile generation.

pub mod profiles;
pub mod synth;

pub use profiles::*;
pub use synth::*;
