//! Model evaluation for the power and hyperbolic-ratio CRFs.
//!
//! Both models factor as `R(c) = amplitude * basis(c, shape-params)`:
//!
//! - power: `R(c) = a * c^b`, basis `c^b`, amplitude `a`
//! - hyper: `R(c) = Rmax * c^n / (c^n + c50^n)`, basis `c^n / (c^n + c50^n)`,
//!   amplitude `Rmax`
//!
//! The fitter exploits this: shape parameters are found by grid search while
//! the amplitude is solved in closed form per candidate.

use crate::domain::ModelKind;

/// Predict `R(c)` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_len()`. Callers size the
/// parameter vector at configuration time.
pub fn predict(model: ModelKind, contrast: f64, params: &[f64]) -> f64 {
    params[0] * basis(model, contrast, &params[1..])
}

/// Evaluate the nonlinear basis (the model with unit amplitude).
///
/// `shape` holds the non-amplitude parameters: `[b]` for power,
/// `[c50, n]` for hyper.
pub fn basis(model: ModelKind, contrast: f64, shape: &[f64]) -> f64 {
    let c = contrast.max(0.0);
    match model {
        ModelKind::Power => c.powf(shape[0]),
        ModelKind::Hyper => {
            let (c50, n) = (shape[0], shape[1]);
            let cn = c.powf(n);
            let denom = cn + c50.powf(n);
            if denom > 0.0 { cn / denom } else { 0.0 }
        }
    }
}

/// Contrast at half-maximum response: the `x` with `R(x) = R(1) / 2`.
///
/// Both models admit closed forms:
///
/// - power: `a * x^b = a / 2  =>  x = 0.5^(1/b)`
/// - hyper: `x^n / (x^n + c50^n) = 1 / (2 * (1 + c50^n))`
///   `=>  x = c50 * (1 + 2 * c50^n)^(-1/n)`
///
/// Returns `None` where the inverse is undefined (flat curve, `b <= 0` or
/// `n <= 0`, degenerate `c50`).
pub fn inverse_half_max(model: ModelKind, params: &[f64]) -> Option<f64> {
    match model {
        ModelKind::Power => {
            let b = params[1];
            if b > 0.0 && b.is_finite() {
                Some(0.5f64.powf(1.0 / b))
            } else {
                None
            }
        }
        ModelKind::Hyper => {
            let (c50, n) = (params[1], params[2]);
            if !(c50 > 0.0 && c50.is_finite() && n > 0.0 && n.is_finite()) {
                return None;
            }
            let x = c50 * (1.0 + 2.0 * c50.powf(n)).powf(-1.0 / n);
            x.is_finite().then_some(x)
        }
    }
}

/// Semisaturation contrast.
///
/// For the hyper model this is the `c50` parameter directly; the power model
/// has no such parameter, so it is derived from the half-maximum inverse.
pub fn semisaturation(model: ModelKind, params: &[f64]) -> Option<f64> {
    match model {
        ModelKind::Power => inverse_half_max(model, params),
        ModelKind::Hyper => {
            let c50 = params[1];
            (c50.is_finite() && c50 >= 0.0).then_some(c50)
        }
    }
}
