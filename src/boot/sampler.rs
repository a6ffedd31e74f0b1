//! Bootstrap resampling of subjects and the parallel fit fan-out.
//!
//! Each iteration draws a with-replacement subject subset (size = original
//! subject count) and fits one CRF per depth level against the resample's
//! per-condition means. The same draw is used at every depth level within an
//! iteration, preserving cross-depth correlation structure.
//!
//! Iterations are embarrassingly parallel: inputs are read-only, every
//! iteration writes its own row of the result matrices, and each iteration
//! seeds its own generator from the master seed and its index — so results
//! are identical for any worker count.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{BootRun, DepthProfile, IterMatrix, RunConfig};
use crate::error::AppError;
use crate::fit::{fit_crf, validate_search_windows, DepthFit, FitOptions};

/// Counter-based RNG seed derivation using SplitMix64.
///
/// A stateless hash of (master seed, iteration index) gives every iteration
/// a well-distributed, reproducible seed without any sequential coupling
/// between workers.
#[inline]
pub fn iteration_seed(master_seed: u64, iteration: u64) -> u64 {
    let mut z = master_seed.wrapping_add(iteration.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Run the bootstrap for one region.
///
/// Configuration must already be validated (`RunConfig::validate`); this
/// additionally checks the profile's condition axis against the contrast
/// vector, the one shape constraint only visible once data is loaded.
pub fn run_bootstrap(profile: &DepthProfile, config: &RunConfig) -> Result<BootRun, AppError> {
    if profile.conditions != config.contrasts.len() {
        return Err(AppError::config(format!(
            "Region '{}': profile has {} conditions but {} contrast levels were supplied.",
            profile.region,
            profile.conditions,
            config.contrasts.len()
        )));
    }
    validate_search_windows(config.model, &config.bounds)?;

    let opts = FitOptions {
        model: config.model,
        bounds: config.bounds.clone(),
        num_x: config.num_x,
        grid_steps: config.grid_steps,
        grid_refinements: config.grid_refinements,
    };

    // Worker budget is a resource knob, not a correctness knob: 0 lets rayon
    // size the pool to the machine.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to build worker pool: {e}")))?;

    let iterations = config.iterations;
    let outcomes: Vec<Vec<Option<DepthFit>>> = pool.install(|| {
        (0..iterations)
            .into_par_iter()
            .map(|it| run_iteration(profile, config, &opts, it))
            .collect()
    });

    Ok(collect_outcomes(profile, config, outcomes))
}

/// One bootstrap iteration: draw subjects, fit every depth level.
fn run_iteration(
    profile: &DepthProfile,
    config: &RunConfig,
    opts: &FitOptions,
    iteration: usize,
) -> Vec<Option<DepthFit>> {
    let mut rng = StdRng::seed_from_u64(iteration_seed(config.seed, iteration as u64));

    let draw: Vec<usize> = (0..profile.subjects)
        .map(|_| rng.gen_range(0..profile.subjects))
        .collect();

    let mut means = vec![0.0; profile.conditions];
    (0..profile.depths)
        .map(|depth| {
            profile.condition_means(&draw, depth, &mut means);
            fit_crf(&config.contrasts, &means, opts).ok()
        })
        .collect()
}

/// Scatter per-iteration fits into the pre-sized, iteration-major matrices.
fn collect_outcomes(
    profile: &DepthProfile,
    config: &RunConfig,
    outcomes: Vec<Vec<Option<DepthFit>>>,
) -> BootRun {
    let (iters, depths, conds, num_x) = (
        config.iterations,
        profile.depths,
        profile.conditions,
        config.num_x,
    );

    let mut curves = IterMatrix::nan_filled(iters, depths * num_x);
    let mut half_max = IterMatrix::nan_filled(iters, depths);
    let mut semi = IterMatrix::nan_filled(iters, depths);
    let mut residuals = IterMatrix::nan_filled(iters, conds * depths);
    let mut failed_fits = 0usize;

    for (it, fits) in outcomes.into_iter().enumerate() {
        for (depth, fit) in fits.into_iter().enumerate() {
            match fit {
                Some(f) => {
                    curves.row_mut(it)[depth * num_x..(depth + 1) * num_x]
                        .copy_from_slice(&f.curve);
                    half_max.row_mut(it)[depth] = f.half_max;
                    semi.row_mut(it)[depth] = f.semi;
                    let res_row = residuals.row_mut(it);
                    for (cond, &r) in f.residuals.iter().enumerate() {
                        res_row[cond * depths + depth] = r;
                    }
                }
                None => failed_fits += 1,
            }
        }
    }

    BootRun {
        region: profile.region.clone(),
        iterations: iters,
        depths,
        conditions: conds,
        num_x,
        curves,
        half_max,
        semi,
        residuals,
        failed_fits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, ParamBounds};
    use crate::models::predict;

    const EMP_CONTRASTS: [f64; 4] = [0.025, 0.061, 0.163, 0.72];

    /// Deterministic synthetic region: every subject follows a power CRF
    /// whose factor varies a little by subject and depth.
    fn synthetic_profile(subjects: usize, depths: usize) -> DepthProfile {
        let conds = EMP_CONTRASTS.len();
        let mut data = Vec::with_capacity(subjects * conds * depths);
        for s in 0..subjects {
            for c in 0..conds {
                for d in 0..depths {
                    let a = 1.5 + 0.1 * s as f64 + 0.05 * d as f64;
                    data.push(predict(ModelKind::Power, EMP_CONTRASTS[c], &[a, 0.5]));
                }
            }
        }
        DepthProfile::new("v1", subjects, conds, depths, data).unwrap()
    }

    fn test_config(iterations: usize, workers: usize) -> RunConfig {
        RunConfig {
            model: ModelKind::Power,
            bounds: ParamBounds::default_for(ModelKind::Power),
            contrasts: EMP_CONTRASTS.to_vec(),
            iterations,
            workers,
            seed: 7,
            num_x: 50,
            grid_steps: 12,
            grid_refinements: 1,
            ci_lower: 2.5,
            ci_upper: 97.5,
            peak_resolution: 100,
            peak_smoothing: 0.05,
            snapshot_out: None,
            export: None,
        }
    }

    #[test]
    fn produces_one_row_per_iteration() {
        let profile = synthetic_profile(6, 3);
        let run = run_bootstrap(&profile, &test_config(40, 2)).unwrap();
        assert_eq!(run.iterations, 40);
        assert_eq!(run.half_max.iters, 40);
        assert_eq!(run.half_max.cols, 3);
        assert_eq!(run.curves.cols, 3 * 50);
        assert_eq!(run.residuals.cols, 4 * 3);
        assert_eq!(run.failed_fits, 0);
    }

    #[test]
    fn results_are_identical_for_any_worker_count() {
        let profile = synthetic_profile(6, 3);
        let a = run_bootstrap(&profile, &test_config(30, 1)).unwrap();
        let b = run_bootstrap(&profile, &test_config(30, 3)).unwrap();
        for it in 0..30 {
            assert_eq!(a.half_max.row(it), b.half_max.row(it));
            assert_eq!(a.semi.row(it), b.semi.row(it));
            assert_eq!(a.curves.row(it), b.curves.row(it));
        }
    }

    #[test]
    fn different_seeds_draw_different_resamples() {
        let profile = synthetic_profile(6, 3);
        let mut config = test_config(20, 1);
        let a = run_bootstrap(&profile, &config).unwrap();
        config.seed = 8;
        let b = run_bootstrap(&profile, &config).unwrap();
        let differs = (0..20).any(|it| a.half_max.row(it) != b.half_max.row(it));
        assert!(differs);
    }

    #[test]
    fn degenerate_depth_is_counted_not_fatal() {
        // Depth 0 is constant across subjects and conditions: every fit at
        // that depth is degenerate regardless of the draw.
        let subjects = 5;
        let conds = EMP_CONTRASTS.len();
        let depths = 2;
        let mut data = Vec::new();
        for _s in 0..subjects {
            for c in 0..conds {
                for d in 0..depths {
                    if d == 0 {
                        data.push(1.0);
                    } else {
                        data.push(predict(ModelKind::Power, EMP_CONTRASTS[c], &[2.0, 0.5]));
                    }
                }
            }
        }
        let profile = DepthProfile::new("flat", subjects, conds, depths, data).unwrap();

        let run = run_bootstrap(&profile, &test_config(25, 2)).unwrap();
        assert_eq!(run.failed_fits, 25);
        // The degenerate depth holds NaN placeholders; the good depth is full.
        assert!(run.half_max.row(0)[0].is_nan());
        assert!(run.half_max.row(0)[1].is_finite());
    }

    #[test]
    fn condition_count_mismatch_is_config_error() {
        let profile = synthetic_profile(4, 2);
        let mut config = test_config(5, 1);
        config.contrasts = vec![0.1, 0.5];
        let err = run_bootstrap(&profile, &config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unsearchable_bounds_fail_before_any_iteration() {
        let profile = synthetic_profile(4, 2);
        let mut config = test_config(5, 1);
        // Exponent window entirely above the power search cap.
        config.bounds = ParamBounds {
            lower: vec![0.0, 5.0],
            upper: vec![10.0, 6.0],
        };
        let err = run_bootstrap(&profile, &config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn iteration_seeds_are_distinct() {
        let seeds: Vec<u64> = (0..100).map(|i| iteration_seed(42, i)).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }
}
