//! Shared pipeline logic used by the `fit`, `demo`, and `summarize`
//! subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! profiles -> bootstrap -> aggregation -> peak search -> summaries
//!
//! The CLI front-end then focuses on argument handling and presentation.

use crate::boot::run_bootstrap;
use crate::domain::{BootRun, DepthProfile, RunConfig};
use crate::error::AppError;
use crate::peak::{find_peaks, PeakOptions};
use crate::stats::{
    residual_depth_means, residual_grand_means, summarize_matrix, summarize_values, PeakSummary,
    RegionSummary,
};

/// All computed outputs of a bootstrap run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Raw all-iterations arrays, per region (snapshot material).
    pub runs: Vec<BootRun>,
    /// Aggregated summaries, per region (report/export material).
    pub summaries: Vec<RegionSummary>,
}

/// Execute the full pipeline: bootstrap every region, then summarize.
pub fn run_fit(config: &RunConfig, profiles: &[DepthProfile]) -> Result<RunOutput, AppError> {
    config.validate()?;
    if profiles.is_empty() {
        return Err(AppError::config("No regions to fit."));
    }

    let mut runs = Vec::with_capacity(profiles.len());
    for profile in profiles {
        runs.push(run_bootstrap(profile, config)?);
    }

    let peak = PeakOptions {
        resolution: config.peak_resolution,
        smoothing: config.peak_smoothing,
    };
    let summaries = runs
        .iter()
        .map(|run| summarize_region(run, config.ci_lower, config.ci_upper, &peak))
        .collect();

    Ok(RunOutput { runs, summaries })
}

/// Aggregate one region's all-iterations arrays into report-ready summaries.
///
/// Also used by `summarize` on snapshot-loaded runs, which is what makes
/// re-aggregation without re-fitting possible.
pub fn summarize_region(
    run: &BootRun,
    ci_lower: f64,
    ci_upper: f64,
    peak: &PeakOptions,
) -> RegionSummary {
    let half_max = summarize_matrix(&run.half_max, ci_lower, ci_upper);
    let semi = summarize_matrix(&run.semi, ci_lower, ci_upper);
    let curves = summarize_matrix(&run.curves, ci_lower, ci_upper);

    let depth_means = residual_depth_means(run);
    let residual = summarize_matrix(&depth_means, ci_lower, ci_upper);
    let residual_grand = summarize_values(&residual_grand_means(run), ci_lower, ci_upper);

    let peak_half_max = find_peaks(&run.half_max, peak);
    let peak_semi = find_peaks(&run.semi, peak);

    RegionSummary {
        region: run.region.clone(),
        iterations: run.iterations,
        depths: run.depths,
        num_x: run.num_x,
        failed_fits: run.failed_fits,
        attempted_fits: run.attempted_fits(),
        half_max,
        semi,
        residual,
        residual_grand,
        curves,
        peak_half_max: PeakSummary {
            stats: summarize_values(&peak_half_max.positions, ci_lower, ci_upper),
            excluded: peak_half_max.excluded,
        },
        peak_semi: PeakSummary {
            stats: summarize_values(&peak_semi.positions, ci_lower, ci_upper),
            excluded: peak_semi.excluded,
        },
    }
}
