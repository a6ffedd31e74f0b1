//! Low-level fitting routine for a single model kind.
//!
//! Given:
//! - contrast levels `c_i`
//! - one empirical response vector `y_i` (per-condition means of a resample)
//! - per-parameter box bounds
//!
//! we search the nonlinear shape parameter(s) on a deterministic grid and,
//! for each candidate, solve the amplitude (power `a`, hyper `Rmax`) in
//! closed form by least squares, clamped to its bounds. The candidate with
//! the lowest SSE wins; ties break toward the lower grid index. Refinement
//! passes re-grid the cells adjacent to the incumbent best.
//!
//! Failures here are recoverable by design: a bootstrap iteration that hits
//! a degenerate resample skips this depth level and the run continues.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelKind, ParamBounds};
use crate::fit::param_grid::{
    hyper_c50_window, hyper_exponent_window, lin_space, log_space, power_exponent_window,
    refine_span,
};
use crate::math::solve_least_squares;
use crate::models::{basis, inverse_half_max, predict, semisaturation};

/// Fitting options shared by every fit in a run.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub model: ModelKind,
    pub bounds: ParamBounds,
    /// Dense x-grid resolution for the fitted curve over [0,1].
    pub num_x: usize,
    /// Grid-search steps per shape dimension.
    pub grid_steps: usize,
    /// Coarse-to-fine passes after the initial grid.
    pub grid_refinements: usize,
}

/// One successful bounded fit at a single depth level.
#[derive(Debug, Clone)]
pub struct DepthFit {
    /// Full parameter vector: `[a, b]` (power) or `[Rmax, c50, n]` (hyper).
    pub params: Vec<f64>,
    /// Model curve sampled at `num_x` points over [0,1].
    pub curve: Vec<f64>,
    /// Contrast at half-maximum response.
    pub half_max: f64,
    /// Semisaturation contrast.
    pub semi: f64,
    /// Squared residual per condition.
    pub residuals: Vec<f64>,
    pub sse: f64,
}

/// Recoverable per-fit failure. Does not abort the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// The response vector cannot support a model fit.
    Degenerate(String),
    /// No candidate produced a finite bounded solution.
    NoConvergence,
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Degenerate(msg) => write!(f, "degenerate input: {msg}"),
            FitError::NoConvergence => write!(f, "no fit candidate converged within bounds"),
        }
    }
}

impl std::error::Error for FitError {}

#[derive(Debug, Clone)]
struct Candidate {
    shape: Vec<f64>,
    amp: f64,
    sse: f64,
}

/// Fit one contrast response function.
pub fn fit_crf(contrasts: &[f64], responses: &[f64], opts: &FitOptions) -> Result<DepthFit, FitError> {
    let n = contrasts.len();
    if responses.len() != n {
        return Err(FitError::Degenerate(format!(
            "{} responses for {n} contrast levels",
            responses.len()
        )));
    }
    if responses.iter().any(|v| !v.is_finite()) {
        return Err(FitError::Degenerate("non-finite response value".to_string()));
    }
    if n < opts.model.param_len() + 1 {
        return Err(FitError::Degenerate(format!(
            "{n} points cannot constrain {} parameters",
            opts.model.param_len()
        )));
    }
    let (min_y, max_y) = responses
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if (max_y - min_y).abs() < 1e-12 {
        return Err(FitError::Degenerate("constant response vector".to_string()));
    }

    let best = match opts.model {
        ModelKind::Power => search_power(contrasts, responses, opts),
        ModelKind::Hyper => search_hyper(contrasts, responses, opts),
    }
    .ok_or(FitError::NoConvergence)?;

    let mut params = Vec::with_capacity(opts.model.param_len());
    params.push(best.amp);
    params.extend_from_slice(&best.shape);

    let curve: Vec<f64> = (0..opts.num_x)
        .map(|i| {
            let x = i as f64 / (opts.num_x as f64 - 1.0);
            predict(opts.model, x, &params)
        })
        .collect();

    // The inverse is analytic for both models; the numeric fallback only
    // matters for parameter corners where it is undefined (e.g. b at the
    // exponent floor), and mirrors searching the dense curve directly.
    let half_max = inverse_half_max(opts.model, &params)
        .unwrap_or_else(|| half_max_from_curve(&curve));
    let semi = semisaturation(opts.model, &params).unwrap_or(half_max);

    let residuals: Vec<f64> = contrasts
        .iter()
        .zip(responses.iter())
        .map(|(&c, &y)| {
            let r = y - predict(opts.model, c, &params);
            r * r
        })
        .collect();

    Ok(DepthFit {
        params,
        curve,
        half_max,
        semi,
        residuals,
        sse: best.sse,
    })
}

/// Grid search + refinement over the power exponent.
fn search_power(contrasts: &[f64], responses: &[f64], opts: &FitOptions) -> Option<Candidate> {
    let (mut lo, mut hi) = power_exponent_window(&opts.bounds).ok()?;
    let mut best: Option<(usize, Candidate)> = None;

    for _ in 0..=opts.grid_refinements {
        let exponents = lin_space(lo, hi, opts.grid_steps).ok()?;
        best = None;
        for (idx, &b) in exponents.iter().enumerate() {
            let Some(cand) = evaluate_candidate(contrasts, responses, &[b], opts) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, inc)| cand.sse < inc.sse) {
                best = Some((idx, cand));
            }
        }
        let (idx, _) = best.as_ref()?;
        (lo, hi) = refine_span(&exponents, *idx);
    }

    best.map(|(_, cand)| cand)
}

/// Grid search + refinement over (c50, n) pairs.
fn search_hyper(contrasts: &[f64], responses: &[f64], opts: &FitOptions) -> Option<Candidate> {
    let (mut c50_lo, mut c50_hi) = hyper_c50_window(&opts.bounds).ok()?;
    let (mut n_lo, mut n_hi) = hyper_exponent_window(&opts.bounds).ok()?;
    let mut best: Option<(usize, usize, Candidate)> = None;

    for _ in 0..=opts.grid_refinements {
        let c50s = log_space(c50_lo, c50_hi, opts.grid_steps).ok()?;
        let ns = lin_space(n_lo, n_hi, opts.grid_steps).ok()?;
        best = None;
        for (i, &c50) in c50s.iter().enumerate() {
            for (j, &n) in ns.iter().enumerate() {
                let Some(cand) = evaluate_candidate(contrasts, responses, &[c50, n], opts) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(_, _, inc)| cand.sse < inc.sse) {
                    best = Some((i, j, cand));
                }
            }
        }
        let (i, j, _) = best.as_ref()?;
        (c50_lo, c50_hi) = refine_span(&c50s, *i);
        (n_lo, n_hi) = refine_span(&ns, *j);
    }

    best.map(|(_, _, cand)| cand)
}

/// Solve the clamped amplitude for one shape candidate and score it.
fn evaluate_candidate(
    contrasts: &[f64],
    responses: &[f64],
    shape: &[f64],
    opts: &FitOptions,
) -> Option<Candidate> {
    let n = contrasts.len();
    let g: Vec<f64> = contrasts.iter().map(|&c| basis(opts.model, c, shape)).collect();
    if g.iter().any(|v| !v.is_finite()) {
        return None;
    }
    // An all-zero basis column cannot determine an amplitude.
    if g.iter().map(|v| v * v).sum::<f64>() < 1e-30 {
        return None;
    }

    let x = DMatrix::from_iterator(n, 1, g.iter().copied());
    let y = DVector::from_iterator(n, responses.iter().copied());
    let beta = solve_least_squares(&x, &y)?;
    let amp = beta[0].clamp(opts.bounds.lower[0], opts.bounds.upper[0]);

    let mut sse = 0.0;
    for i in 0..n {
        let r = responses[i] - amp * g[i];
        sse += r * r;
    }

    if sse.is_finite() {
        Some(Candidate {
            shape: shape.to_vec(),
            amp,
            sse,
        })
    } else {
        None
    }
}

/// Numeric fallback: the dense-grid x whose response is closest to half the
/// full-contrast response.
fn half_max_from_curve(curve: &[f64]) -> f64 {
    let target = curve[curve.len() - 1] / 2.0;
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, &v) in curve.iter().enumerate() {
        let d = (v - target).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best as f64 / (curve.len() as f64 - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, ParamBounds};

    const EMP_CONTRASTS: [f64; 4] = [0.025, 0.061, 0.163, 0.72];

    fn power_opts() -> FitOptions {
        FitOptions {
            model: ModelKind::Power,
            bounds: ParamBounds::default_for(ModelKind::Power),
            num_x: 101,
            grid_steps: 32,
            grid_refinements: 2,
        }
    }

    fn hyper_opts() -> FitOptions {
        FitOptions {
            model: ModelKind::Hyper,
            bounds: ParamBounds::default_for(ModelKind::Hyper),
            num_x: 101,
            grid_steps: 24,
            grid_refinements: 3,
        }
    }

    #[test]
    fn power_fit_recovers_noiseless_parameters() {
        let truth = [2.0, 0.5];
        let responses: Vec<f64> = EMP_CONTRASTS
            .iter()
            .map(|&c| predict(ModelKind::Power, c, &truth))
            .collect();

        let fit = fit_crf(&EMP_CONTRASTS, &responses, &power_opts()).unwrap();
        assert!((fit.params[0] - 2.0).abs() < 1e-2, "a = {}", fit.params[0]);
        assert!((fit.params[1] - 0.5).abs() < 1e-2, "b = {}", fit.params[1]);
        assert!(fit.sse < 1e-6);
        // Half-max for b = 0.5 is 0.5^(1/0.5) = 0.25.
        assert!((fit.half_max - 0.25).abs() < 0.02);
        assert_eq!(fit.half_max, fit.semi);
        assert!(fit.residuals.iter().all(|&r| r < 1e-6));
    }

    #[test]
    fn hyper_fit_recovers_noiseless_curve() {
        let truth = [2.0, 0.15, 1.4];
        let responses: Vec<f64> = EMP_CONTRASTS
            .iter()
            .map(|&c| predict(ModelKind::Hyper, c, &truth))
            .collect();

        let fit = fit_crf(&EMP_CONTRASTS, &responses, &hyper_opts()).unwrap();
        assert!(fit.sse < 1e-5, "sse = {}", fit.sse);

        // The (c50, n) surface is shallow along its ridge, so judge the fit
        // by predictions and derived quantities rather than raw parameters.
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            let want = predict(ModelKind::Hyper, x, &truth);
            let got = predict(ModelKind::Hyper, x, &fit.params);
            assert!((want - got).abs() < 1e-2, "curve mismatch at {x}: {want} vs {got}");
        }
        let want_half = inverse_half_max(ModelKind::Hyper, &truth).unwrap();
        assert!((fit.half_max - want_half).abs() < 0.02);
        assert!((fit.semi - 0.15).abs() < 0.05);
    }

    #[test]
    fn fitted_parameters_stay_within_bounds() {
        // Noisy, awkward responses: the clamp and windows must still hold.
        let responses = [1.9, 0.4, 2.6, 1.1];
        let opts = power_opts();
        let fit = fit_crf(&EMP_CONTRASTS, &responses, &opts).unwrap();
        for i in 0..2 {
            assert!(fit.params[i] >= opts.bounds.lower[i] - 1e-12);
            assert!(fit.params[i] <= opts.bounds.upper[i] + 1e-12);
        }
    }

    #[test]
    fn constant_response_is_degenerate() {
        let responses = [0.7; 4];
        let err = fit_crf(&EMP_CONTRASTS, &responses, &power_opts()).unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
    }

    #[test]
    fn non_finite_response_is_degenerate() {
        let responses = [0.1, f64::NAN, 0.5, 0.9];
        let err = fit_crf(&EMP_CONTRASTS, &responses, &power_opts()).unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let err = fit_crf(&[0.1, 0.5], &[0.2, 0.9], &power_opts()).unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
        let err = fit_crf(&[0.1, 0.5, 0.9], &[0.2, 0.9, 1.0], &hyper_opts()).unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
    }

    #[test]
    fn identical_inputs_fit_identically() {
        let responses = [0.6, 0.9, 1.4, 2.1];
        let a = fit_crf(&EMP_CONTRASTS, &responses, &power_opts()).unwrap();
        let b = fit_crf(&EMP_CONTRASTS, &responses, &power_opts()).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.curve, b.curve);
        assert_eq!(a.sse, b.sse);
    }
}
