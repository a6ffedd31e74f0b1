//! Relative peak position of a noisy per-depth profile.
//!
//! For each bootstrap iteration we have a handful of per-depth scalars (for
//! example the half-maximum contrast at each of 11 depth levels). The depth
//! axis is normalized to [0,1] (white-matter to pial surface), the profile is
//! upsampled through a Gaussian-kernel smoothing interpolant, and the peak is
//! the x-position of the interpolant's maximum.
//!
//! Flat or monotonic profiles legitimately peak at a boundary (0 or 1); that
//! is a finding, not an error. Iterations containing non-finite values
//! (failed-fit placeholders) are excluded and counted.

use crate::domain::IterMatrix;

/// Peak-search options.
#[derive(Debug, Clone, Copy)]
pub struct PeakOptions {
    /// Number of interpolation points over the normalized depth axis.
    pub resolution: usize,
    /// Gaussian kernel bandwidth, in relative depth units.
    pub smoothing: f64,
}

/// Peak positions for all usable iterations of one profile matrix.
#[derive(Debug, Clone)]
pub struct PeakResult {
    /// One relative peak position in [0,1] per usable iteration.
    pub positions: Vec<f64>,
    /// Iterations excluded because their depth vector was not fully finite.
    pub excluded: usize,
}

/// Smooth one depth vector and locate its maximum.
///
/// Returns `None` when any value is non-finite — a partial profile cannot be
/// smoothed honestly.
pub fn peak_position(values: &[f64], opts: &PeakOptions) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let d = values.len();
    let span = (d - 1).max(1) as f64;

    let mut best_u = 0.0;
    let mut best_s = f64::NEG_INFINITY;
    for i in 0..opts.resolution {
        let u = i as f64 / (opts.resolution as f64 - 1.0);
        let mut num = 0.0;
        let mut den = 0.0;
        for (j, &v) in values.iter().enumerate() {
            let x = j as f64 / span;
            let t = (u - x) / opts.smoothing;
            let w = (-0.5 * t * t).exp();
            num += w * v;
            den += w;
        }
        // den > 0 always: the kernel is positive everywhere.
        let s = num / den;
        if s > best_s {
            best_s = s;
            best_u = u;
        }
    }

    Some(best_u)
}

/// Locate the peak for every iteration of an iteration-major matrix.
pub fn find_peaks(matrix: &IterMatrix, opts: &PeakOptions) -> PeakResult {
    let mut positions = Vec::with_capacity(matrix.iters);
    let mut excluded = 0usize;
    for it in 0..matrix.iters {
        match peak_position(matrix.row(it), opts) {
            Some(u) => positions.push(u),
            None => excluded += 1,
        }
    }
    PeakResult {
        positions,
        excluded,
    }
}
