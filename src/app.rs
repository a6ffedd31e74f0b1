//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into a `RunConfig`
//! - loads or synthesizes depth profiles
//! - runs the bootstrap + aggregation pipeline
//! - prints the report and writes optional snapshot/CSV outputs

use clap::Parser;

use crate::cli::{AggregateArgs, Cli, Command, DemoArgs, FitArgs, RunArgs, SummarizeArgs};
use crate::data::{generate_profiles, read_profiles_json, SynthSpec};
use crate::domain::{
    validate_ci_bounds, BootRun, DepthProfile, ModelKind, ParamBounds, RunConfig,
    DEFAULT_CONTRASTS,
};
use crate::error::AppError;
use crate::io::{read_snapshot, write_snapshot, write_summary_csv};
use crate::peak::PeakOptions;
use crate::report::format_run_summary;
use crate::stats::RegionSummary;

pub mod pipeline;

/// Entry point for the `crfd` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Summarize(args) => handle_summarize(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let loaded = read_profiles_json(&args.input)?;
    let config = run_config(&args.run, loaded.contrasts)?;
    execute(&config, &loaded.regions)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let contrasts = match &args.contrasts {
        Some(list) => parse_value_list(list)?,
        None => DEFAULT_CONTRASTS.to_vec(),
    };
    let spec = SynthSpec {
        regions: args.regions,
        subjects: args.subjects,
        depths: args.depths,
        seed: args.run.seed,
        noise: args.noise,
    };
    let profiles = generate_profiles(&spec, &contrasts)?;
    let config = run_config(&args.run, contrasts)?;
    execute(&config, &profiles)
}

fn handle_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    validate_aggregate_args(&args.aggregate)?;

    let snapshot = read_snapshot(&args.snapshot)?;
    let peak = PeakOptions {
        resolution: args.aggregate.peak_resolution,
        smoothing: args.aggregate.peak_smoothing,
    };
    let summaries: Vec<RegionSummary> = snapshot
        .runs
        .iter()
        .map(|run| {
            pipeline::summarize_region(
                run,
                args.aggregate.ci_lower,
                args.aggregate.ci_upper,
                &peak,
            )
        })
        .collect();

    print_and_export(
        &summaries,
        snapshot.model,
        &args.aggregate,
        None,
        &[],
        &snapshot.contrasts,
    )
}

/// Run the pipeline and emit every requested output.
fn execute(config: &RunConfig, profiles: &[DepthProfile]) -> Result<(), AppError> {
    let output = pipeline::run_fit(config, profiles)?;

    let aggregate = AggregateArgs {
        ci_lower: config.ci_lower,
        ci_upper: config.ci_upper,
        peak_resolution: config.peak_resolution,
        peak_smoothing: config.peak_smoothing,
        export: config.export.clone(),
    };
    print_and_export(
        &output.summaries,
        config.model,
        &aggregate,
        config.snapshot_out.as_deref(),
        &output.runs,
        &config.contrasts,
    )
}

fn print_and_export(
    summaries: &[RegionSummary],
    model: ModelKind,
    aggregate: &AggregateArgs,
    snapshot_out: Option<&std::path::Path>,
    runs: &[BootRun],
    contrasts: &[f64],
) -> Result<(), AppError> {
    print!(
        "{}",
        format_run_summary(summaries, model, aggregate.ci_lower, aggregate.ci_upper)
    );

    if let Some(path) = snapshot_out {
        write_snapshot(path, model, contrasts, runs)?;
        println!("\nSnapshot written to {}", path.display());
    }
    if let Some(path) = &aggregate.export {
        write_summary_csv(path, summaries)?;
        println!("\nSummary CSV written to {}", path.display());
    }

    Ok(())
}

/// Build the pipeline configuration from CLI flags.
fn run_config(args: &RunArgs, contrasts: Vec<f64>) -> Result<RunConfig, AppError> {
    let mut bounds = ParamBounds::default_for(args.model);
    if let Some(list) = &args.lower {
        bounds.lower = parse_value_list(list)?;
    }
    if let Some(list) = &args.upper {
        bounds.upper = parse_value_list(list)?;
    }

    Ok(RunConfig {
        model: args.model,
        bounds,
        contrasts,
        iterations: args.iterations,
        workers: args.workers,
        seed: args.seed,
        num_x: args.num_x,
        grid_steps: args.grid_steps,
        grid_refinements: args.grid_refinements,
        ci_lower: args.aggregate.ci_lower,
        ci_upper: args.aggregate.ci_upper,
        peak_resolution: args.aggregate.peak_resolution,
        peak_smoothing: args.aggregate.peak_smoothing,
        snapshot_out: args.snapshot.clone(),
        export: args.aggregate.export.clone(),
    })
}

fn validate_aggregate_args(args: &AggregateArgs) -> Result<(), AppError> {
    validate_ci_bounds(args.ci_lower, args.ci_upper)?;
    if args.peak_resolution < 2 {
        return Err(AppError::config("Peak interpolation resolution must be >= 2."));
    }
    if !(args.peak_smoothing.is_finite() && args.peak_smoothing > 0.0) {
        return Err(AppError::config(format!(
            "Peak smoothing bandwidth must be positive (got {}).",
            args.peak_smoothing
        )));
    }
    Ok(())
}

/// Parse a comma-separated list of numbers; "inf" spells infinity.
fn parse_value_list(list: &str) -> Result<Vec<f64>, AppError> {
    list.split(',')
        .map(|token| {
            let token = token.trim();
            if token.eq_ignore_ascii_case("inf") {
                Ok(f64::INFINITY)
            } else {
                token
                    .parse::<f64>()
                    .map_err(|e| AppError::config(format!("Invalid numeric value '{token}': {e}")))
            }
        })
        .collect()
}
