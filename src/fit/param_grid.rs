//! Shape-parameter search grids.
//!
//! We fit both CRF variants using a deterministic grid search over the
//! nonlinear shape parameters (power: exponent; hyper: semisaturation and
//! exponent), refining around the incumbent best.
//!
//! Why grid search?
//! - It avoids the local-minima and starting-point sensitivity of generic
//!   nonlinear optimizers on 4-point datasets.
//! - It is deterministic given the same inputs/flags, which the bootstrap
//!   needs for reproducible reruns.
//! - With one or two shape dimensions, a modest grid is fast enough for
//!   thousands of resampled fits.

use crate::domain::{ModelKind, ParamBounds};
use crate::error::AppError;

/// Exponent values this close to zero produce flat curves with no defined
/// half-maximum; the search floor keeps candidates away from them.
pub const EXP_FLOOR: f64 = 1e-3;

/// Search caps intersecting infinite upper bounds: contrasts live in [0,1],
/// so semisaturation beyond 10 or exponents beyond these values are outside
/// any physiologically plausible fit.
pub const POWER_EXP_CAP: f64 = 4.0;
pub const HYPER_C50_FLOOR: f64 = 1e-3;
pub const HYPER_C50_CAP: f64 = 10.0;
pub const HYPER_EXP_CAP: f64 = 6.0;

/// Generate `steps` linearly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::config(format!(
            "Invalid grid range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::config("Grid steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    Ok((0..steps).map(|i| min + step * i as f64).collect())
}

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > min) {
        return Err(AppError::config(format!(
            "Invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::config("Grid steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);
    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Intersect a parameter's bounds with the model's search window.
fn search_window(lower: f64, upper: f64, floor: f64, cap: f64) -> Result<(f64, f64), AppError> {
    let lo = lower.max(floor);
    let hi = upper.min(cap);
    if hi <= lo {
        return Err(AppError::config(format!(
            "Parameter bounds [{lower}, {upper}] leave no searchable range inside [{floor}, {cap}]."
        )));
    }
    Ok((lo, hi))
}

/// Searchable window for the power exponent `b`.
pub fn power_exponent_window(bounds: &ParamBounds) -> Result<(f64, f64), AppError> {
    search_window(bounds.lower[1], bounds.upper[1], EXP_FLOOR, POWER_EXP_CAP)
}

/// Searchable window for the hyper semisaturation `c50`.
pub fn hyper_c50_window(bounds: &ParamBounds) -> Result<(f64, f64), AppError> {
    search_window(bounds.lower[1], bounds.upper[1], HYPER_C50_FLOOR, HYPER_C50_CAP)
}

/// Searchable window for the hyper exponent `n`.
pub fn hyper_exponent_window(bounds: &ParamBounds) -> Result<(f64, f64), AppError> {
    search_window(bounds.lower[2], bounds.upper[2], EXP_FLOOR, HYPER_EXP_CAP)
}

/// Fail-fast check that the bounds leave searchable shape windows.
///
/// Without this, an impossible window would only show up as every single
/// fit "failing to converge" — a configuration mistake disguised as a
/// statistical one.
pub fn validate_search_windows(model: ModelKind, bounds: &ParamBounds) -> Result<(), AppError> {
    match model {
        ModelKind::Power => power_exponent_window(bounds).map(|_| ()),
        ModelKind::Hyper => {
            hyper_c50_window(bounds)?;
            hyper_exponent_window(bounds).map(|_| ())
        }
    }
}

/// The span one refinement pass searches: the grid cells adjacent to the
/// incumbent best value. `values` always has at least two entries, so the
/// span is non-empty even when the best sits on a grid edge.
pub fn refine_span(values: &[f64], best: usize) -> (f64, f64) {
    let lo = values[best.saturating_sub(1)];
    let hi = values[(best + 1).min(values.len() - 1)];
    (lo, hi)
}
