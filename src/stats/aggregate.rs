//! Median / percentile reduction across bootstrap iterations.
//!
//! Percentiles use the R-7 definition (linear interpolation between order
//! statistics), matching `numpy.percentile`'s default so that summaries of a
//! given all-iterations array are comparable across toolchains.
//!
//! NaN entries are failed-fit placeholders; every reduction skips them and
//! reports how many values it actually summarized, so a run's effective
//! sample size is never misstated.

use crate::domain::{BootRun, IterMatrix};

/// Median + percentile interval for one scalar quantity.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSummary {
    pub median: f64,
    pub lower: f64,
    pub upper: f64,
    /// Number of finite values the summary was computed from.
    pub samples: usize,
}

/// Column-wise summaries of an iteration-major matrix.
#[derive(Debug, Clone)]
pub struct Summary {
    pub median: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub samples: Vec<usize>,
}

/// R-7 percentile of a sorted, finite, non-empty slice. `p` in percent.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * (p / 100.0);
    let lo = h.floor() as usize;
    let frac = h - h.floor();
    if lo >= n - 1 {
        return sorted[n - 1];
    }
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

/// Summarize one set of per-iteration values (NaN-skipping).
pub fn summarize_values(values: &[f64], ci_lower: f64, ci_upper: f64) -> ScalarSummary {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return ScalarSummary {
            median: f64::NAN,
            lower: f64::NAN,
            upper: f64::NAN,
            samples: 0,
        };
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    ScalarSummary {
        median: percentile_sorted(&finite, 50.0),
        lower: percentile_sorted(&finite, ci_lower),
        upper: percentile_sorted(&finite, ci_upper),
        samples: finite.len(),
    }
}

/// Summarize every column of an iteration-major matrix.
pub fn summarize_matrix(matrix: &IterMatrix, ci_lower: f64, ci_upper: f64) -> Summary {
    let mut median = Vec::with_capacity(matrix.cols);
    let mut lower = Vec::with_capacity(matrix.cols);
    let mut upper = Vec::with_capacity(matrix.cols);
    let mut samples = Vec::with_capacity(matrix.cols);

    let mut column = Vec::with_capacity(matrix.iters);
    for col in 0..matrix.cols {
        column.clear();
        column.extend(matrix.column(col));
        let s = summarize_values(&column, ci_lower, ci_upper);
        median.push(s.median);
        lower.push(s.lower);
        upper.push(s.upper);
        samples.push(s.samples);
    }

    Summary {
        median,
        lower,
        upper,
        samples,
    }
}

/// Residual variance averaged across conditions, per iteration and depth.
///
/// Confidence intervals on model fit are taken over iterations of this
/// condition mean, not over conditions; an iteration with a failed fit at a
/// depth contributes NaN there and is skipped downstream.
pub fn residual_depth_means(run: &BootRun) -> IterMatrix {
    let mut out = IterMatrix::nan_filled(run.iterations, run.depths);
    for it in 0..run.iterations {
        let row = run.residuals.row(it);
        let out_row = out.row_mut(it);
        for (depth, slot) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for cond in 0..run.conditions {
                sum += row[cond * run.depths + depth];
            }
            *slot = sum / run.conditions as f64;
        }
    }
    out
}

/// Peak-position summary plus its exclusion count.
#[derive(Debug, Clone, Copy)]
pub struct PeakSummary {
    pub stats: ScalarSummary,
    /// Iterations the peak search had to exclude (non-finite depth vectors).
    pub excluded: usize,
}

/// Everything the reporting/export layer needs for one region.
///
/// Per-depth vectors are indexed by depth level; `curves` is depth-major
/// with `num_x` points per depth.
#[derive(Debug, Clone)]
pub struct RegionSummary {
    pub region: String,
    pub iterations: usize,
    pub depths: usize,
    pub num_x: usize,
    pub failed_fits: usize,
    pub attempted_fits: usize,
    pub half_max: Summary,
    pub semi: Summary,
    /// Residual variance, averaged across conditions, per depth.
    pub residual: Summary,
    /// Residual variance averaged across conditions and depths.
    pub residual_grand: ScalarSummary,
    pub curves: Summary,
    pub peak_half_max: PeakSummary,
    pub peak_semi: PeakSummary,
}

impl RegionSummary {
    /// Fraction of attempted fits that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.attempted_fits == 0 {
            0.0
        } else {
            self.failed_fits as f64 / self.attempted_fits as f64
        }
    }

    /// Median curve (and its interval) for one depth level.
    pub fn curve_at_depth(&self, depth: usize) -> (&[f64], &[f64], &[f64]) {
        let span = depth * self.num_x..(depth + 1) * self.num_x;
        (
            &self.curves.median[span.clone()],
            &self.curves.lower[span.clone()],
            &self.curves.upper[span],
        )
    }
}

/// Grand mean of residual variance across conditions and depths, per
/// iteration.
pub fn residual_grand_means(run: &BootRun) -> Vec<f64> {
    let depth_means = residual_depth_means(run);
    (0..run.iterations)
        .map(|it| {
            let row = depth_means.row(it);
            row.iter().sum::<f64>() / row.len() as f64
        })
        .collect()
}
