//! `crf-depth` library crate.
//!
//! The binary (`crfd`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future notebook bindings, batch drivers)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod boot;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod peak;
pub mod report;
pub mod stats;
