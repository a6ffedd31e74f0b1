//! Command-line parsing for the depth-resolved CRF bootstrapper.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/bootstrap code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "crfd",
    version,
    about = "Bootstrapped contrast-response fitting across cortical depth"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bootstrap on a profile JSON file and report summaries.
    Fit(FitArgs),
    /// Re-aggregate a saved snapshot without re-running the bootstrap.
    Summarize(SummarizeArgs),
    /// Run the full pipeline on seeded synthetic profiles (no input file).
    Demo(DemoArgs),
}

/// Options shared by every command that runs the bootstrap.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Which CRF variant to fit.
    #[arg(long, value_enum, default_value_t = ModelKind::Power)]
    pub model: ModelKind,

    /// Number of bootstrap iterations (resamples).
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub iterations: usize,

    /// Worker budget for the parallel fan-out (0 = one per logical CPU).
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Master random seed; reruns with the same seed reproduce exactly.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Dense x-grid resolution for fitted curves over [0,1].
    #[arg(long, default_value_t = 1000)]
    pub num_x: usize,

    /// Grid-search steps per shape parameter.
    #[arg(long, default_value_t = 48)]
    pub grid_steps: usize,

    /// Coarse-to-fine refinement passes around the incumbent best.
    #[arg(long, default_value_t = 2)]
    pub grid_refinements: usize,

    /// Comma-separated per-parameter lower bounds (overrides model defaults).
    #[arg(long)]
    pub lower: Option<String>,

    /// Comma-separated per-parameter upper bounds; "inf" is allowed.
    #[arg(long)]
    pub upper: Option<String>,

    /// Write the raw all-iterations arrays to a snapshot JSON.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[command(flatten)]
    pub aggregate: AggregateArgs,
}

/// Aggregation options, also available when re-summarizing a snapshot.
#[derive(Debug, Parser, Clone)]
pub struct AggregateArgs {
    /// Lower percentile bound, in percent.
    #[arg(long, default_value_t = 2.5)]
    pub ci_lower: f64,

    /// Upper percentile bound, in percent.
    #[arg(long, default_value_t = 97.5)]
    pub ci_upper: f64,

    /// Peak-finder interpolation resolution over the depth axis.
    #[arg(long, default_value_t = 1000)]
    pub peak_resolution: usize,

    /// Peak-finder Gaussian smoothing bandwidth (relative depth units).
    #[arg(long, default_value_t = 0.05)]
    pub peak_smoothing: f64,

    /// Export per-depth summaries to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Arguments for `crfd fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Profile JSON file (regions of subjects x conditions x depths).
    pub input: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments for `crfd summarize`.
#[derive(Debug, Parser, Clone)]
pub struct SummarizeArgs {
    /// Snapshot JSON produced by `crfd fit --snapshot`.
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub aggregate: AggregateArgs,
}

/// Arguments for `crfd demo`.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of synthetic regions.
    #[arg(long, default_value_t = 2)]
    pub regions: usize,

    /// Subjects per region.
    #[arg(long, default_value_t = 8)]
    pub subjects: usize,

    /// Depth levels per profile.
    #[arg(long, default_value_t = 11)]
    pub depths: usize,

    /// Additive noise standard deviation (response units).
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Comma-separated contrast levels in [0,1].
    #[arg(long)]
    pub contrasts: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}
