//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model selection and per-parameter bounds (`ModelKind`, `ParamBounds`)
//! - the empirical depth-profile buffer (`DepthProfile`)
//! - iteration-major result buffers (`IterMatrix`, `BootRun`)
//! - run configuration (`RunConfig`) and the snapshot schema (`SnapshotFile`)

pub mod types;

pub use types::*;
