//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during bootstrapping
//! - written to a snapshot file and re-aggregated later without re-fitting
//! - exported to CSV for downstream reporting

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Stimulus luminance contrasts of the standard four-condition paradigm.
/// Demo runs and tests default to these; real runs take theirs from the
/// profile file.
pub const DEFAULT_CONTRASTS: [f64; 4] = [0.025, 0.061, 0.163, 0.72];

/// Which contrast response model to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Power function: `R(c) = a * c^b`.
    Power,
    /// Hyperbolic ratio: `R(c) = Rmax * c^n / (c^n + c50^n)`.
    Hyper,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Power => "power",
            ModelKind::Hyper => "hyperbolic ratio",
        }
    }

    /// Number of model parameters.
    ///
    /// Power: `[factor, exponent]`. Hyper: `[max response, semisaturation
    /// contrast, exponent]`.
    pub fn param_len(self) -> usize {
        match self {
            ModelKind::Power => 2,
            ModelKind::Hyper => 3,
        }
    }
}

/// Per-parameter box constraints for the fit.
///
/// `lower` and `upper` must have length `model.param_len()`. Upper limits may
/// be `+inf` (the hyper model's conventional defaults); lower limits must be
/// finite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ParamBounds {
    /// Conventional bounds for a model: power `[0,0]..[10,1]`, hyper
    /// `[0,0,0]..[inf,inf,inf]`.
    pub fn default_for(model: ModelKind) -> Self {
        match model {
            ModelKind::Power => Self {
                lower: vec![0.0, 0.0],
                upper: vec![10.0, 1.0],
            },
            ModelKind::Hyper => Self {
                lower: vec![0.0, 0.0, 0.0],
                upper: vec![f64::INFINITY, f64::INFINITY, f64::INFINITY],
            },
        }
    }

    /// Fail-fast validation against the chosen model.
    pub fn validate(&self, model: ModelKind) -> Result<(), AppError> {
        let p = model.param_len();
        if self.lower.len() != p || self.upper.len() != p {
            return Err(AppError::config(format!(
                "Bound vectors must have length {p} for the {} model (got {}/{}).",
                model.display_name(),
                self.lower.len(),
                self.upper.len()
            )));
        }
        for i in 0..p {
            if !self.lower[i].is_finite() {
                return Err(AppError::config(format!(
                    "Lower bound {i} must be finite (got {}).",
                    self.lower[i]
                )));
            }
            if self.upper[i].is_nan() || self.upper[i] <= self.lower[i] {
                return Err(AppError::config(format!(
                    "Upper bound {i} must exceed lower bound (got {}..{}).",
                    self.lower[i], self.upper[i]
                )));
            }
        }
        Ok(())
    }
}

/// Validate the empirical contrast-level vector.
///
/// Levels must be finite and within [0,1]; the half-maximum search assumes a
/// unit contrast range. Length must match the profile's condition axis (that
/// check lives with the profile, which knows its shape).
pub fn validate_contrasts(contrasts: &[f64]) -> Result<(), AppError> {
    if contrasts.is_empty() {
        return Err(AppError::config("Contrast-level vector is empty."));
    }
    for (i, &c) in contrasts.iter().enumerate() {
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(AppError::config(format!(
                "Contrast level {i} must lie in [0,1] (got {c})."
            )));
        }
    }
    Ok(())
}

/// One region's empirical depth profiles: raw signal values of shape
/// (subjects, conditions, depth levels), row-major.
///
/// Immutable input; the bootstrap only ever reads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthProfile {
    pub region: String,
    pub subjects: usize,
    pub conditions: usize,
    pub depths: usize,
    data: Vec<f64>,
}

impl DepthProfile {
    pub fn new(
        region: impl Into<String>,
        subjects: usize,
        conditions: usize,
        depths: usize,
        data: Vec<f64>,
    ) -> Result<Self, AppError> {
        let region = region.into();
        if subjects == 0 || conditions == 0 || depths == 0 {
            return Err(AppError::config(format!(
                "Region '{region}': profile axes must be non-empty \
                 (subjects={subjects}, conditions={conditions}, depths={depths})."
            )));
        }
        if data.len() != subjects * conditions * depths {
            return Err(AppError::config(format!(
                "Region '{region}': expected {} values for shape \
                 ({subjects}, {conditions}, {depths}), got {}.",
                subjects * conditions * depths,
                data.len()
            )));
        }
        Ok(Self {
            region,
            subjects,
            conditions,
            depths,
            data,
        })
    }

    #[inline]
    pub fn value(&self, subject: usize, condition: usize, depth: usize) -> f64 {
        self.data[(subject * self.conditions + condition) * self.depths + depth]
    }

    /// Mean response per condition at one depth level, averaged over the
    /// given subject indices (the bootstrap's resampled draw).
    pub fn condition_means(&self, subjects: &[usize], depth: usize, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.conditions);
        let n = subjects.len() as f64;
        for (cond, slot) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for &s in subjects {
                sum += self.value(s, cond, depth);
            }
            *slot = sum / n;
        }
    }
}

/// A dense iteration-major matrix of bootstrap outputs.
///
/// Row `i` holds iteration `i`'s values; failed fits leave NaN placeholders
/// that the aggregator skips. The whole buffer is pre-sized before the
/// parallel run so every iteration writes a disjoint row.
///
/// JSON cannot represent NaN, so the serialized form stores placeholders as
/// `null` (`Option<f64>`) and restores them on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "IterMatrixRepr", try_from = "IterMatrixRepr")]
pub struct IterMatrix {
    pub iters: usize,
    pub cols: usize,
    data: Vec<f64>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IterMatrixRepr {
    iters: usize,
    cols: usize,
    data: Vec<Option<f64>>,
}

impl From<IterMatrix> for IterMatrixRepr {
    fn from(m: IterMatrix) -> Self {
        Self {
            iters: m.iters,
            cols: m.cols,
            data: m.data.iter().map(|&v| v.is_finite().then_some(v)).collect(),
        }
    }
}

impl TryFrom<IterMatrixRepr> for IterMatrix {
    type Error = String;

    fn try_from(r: IterMatrixRepr) -> Result<Self, String> {
        if r.data.len() != r.iters * r.cols {
            return Err(format!(
                "matrix data length {} does not match shape {}x{}",
                r.data.len(),
                r.iters,
                r.cols
            ));
        }
        Ok(Self {
            iters: r.iters,
            cols: r.cols,
            data: r.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        })
    }
}

impl IterMatrix {
    pub fn nan_filled(iters: usize, cols: usize) -> Self {
        Self {
            iters,
            cols,
            data: vec![f64::NAN; iters * cols],
        }
    }

    #[inline]
    pub fn row(&self, iter: usize) -> &[f64] {
        &self.data[iter * self.cols..(iter + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, iter: usize) -> &mut [f64] {
        &mut self.data[iter * self.cols..(iter + 1) * self.cols]
    }

    /// Values of one column across all iterations (iteration axis).
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.iters).map(move |i| self.data[i * self.cols + col])
    }
}

/// All-iterations bootstrap output for one region.
///
/// Column layouts: `curves` is depth-major (`depth * num_x + x`), `half_max`
/// and `semi` index by depth, `residuals` by `condition * depths + depth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootRun {
    pub region: String,
    pub iterations: usize,
    pub depths: usize,
    pub conditions: usize,
    pub num_x: usize,
    pub curves: IterMatrix,
    pub half_max: IterMatrix,
    pub semi: IterMatrix,
    pub residuals: IterMatrix,
    /// Number of (iteration, depth) fits that failed and were recorded as NaN.
    pub failed_fits: usize,
}

impl BootRun {
    /// Total number of attempted per-depth fits.
    pub fn attempted_fits(&self) -> usize {
        self.iterations * self.depths
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults); nothing here is global
/// state, and two runs with equal configs and seeds produce equal outputs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: ModelKind,
    pub bounds: ParamBounds,
    pub contrasts: Vec<f64>,

    /// How many bootstrap resamples to draw.
    pub iterations: usize,
    /// Worker budget for the iteration fan-out (0 = one per logical CPU).
    pub workers: usize,
    /// Master seed; per-iteration generators derive from it deterministically.
    pub seed: u64,

    /// Dense x-grid resolution for evaluating the fitted curve over [0,1].
    pub num_x: usize,
    /// Grid-search steps per nonlinear parameter dimension.
    pub grid_steps: usize,
    /// Coarse-to-fine refinement passes around the incumbent minimum.
    pub grid_refinements: usize,

    /// Percentile bootstrap bounds, in percent (e.g. 2.5 / 97.5).
    pub ci_lower: f64,
    pub ci_upper: f64,

    /// Peak-finder interpolation grid resolution over the depth axis.
    pub peak_resolution: usize,
    /// Peak-finder Gaussian smoothing bandwidth (relative depth units).
    pub peak_smoothing: f64,

    pub snapshot_out: Option<PathBuf>,
    pub export: Option<PathBuf>,
}

impl RunConfig {
    /// Fail-fast validation of everything that would otherwise surface
    /// mid-run.
    pub fn validate(&self) -> Result<(), AppError> {
        self.bounds.validate(self.model)?;
        validate_contrasts(&self.contrasts)?;
        if self.contrasts.len() < self.model.param_len() + 1 {
            return Err(AppError::config(format!(
                "{} contrast levels cannot constrain the {} model's {} parameters.",
                self.contrasts.len(),
                self.model.display_name(),
                self.model.param_len()
            )));
        }
        if self.iterations == 0 {
            return Err(AppError::config("Iteration count must be > 0."));
        }
        if self.num_x < 2 {
            return Err(AppError::config("Curve grid resolution must be >= 2."));
        }
        if self.grid_steps < 2 {
            return Err(AppError::config("Grid-search steps must be >= 2."));
        }
        validate_ci_bounds(self.ci_lower, self.ci_upper)?;
        if self.peak_resolution < 2 {
            return Err(AppError::config("Peak interpolation resolution must be >= 2."));
        }
        if !(self.peak_smoothing.is_finite() && self.peak_smoothing > 0.0) {
            return Err(AppError::config(format!(
                "Peak smoothing bandwidth must be positive (got {}).",
                self.peak_smoothing
            )));
        }
        Ok(())
    }
}

/// Validate percentile bounds (in percent).
pub fn validate_ci_bounds(lower: f64, upper: f64) -> Result<(), AppError> {
    let ok = lower.is_finite()
        && upper.is_finite()
        && (0.0..=100.0).contains(&lower)
        && (0.0..=100.0).contains(&upper)
        && lower < upper;
    if !ok {
        return Err(AppError::config(format!(
            "Percentile bounds must satisfy 0 <= lower < upper <= 100 (got {lower}/{upper})."
        )));
    }
    Ok(())
}

/// A saved bootstrap snapshot (JSON).
///
/// Persisting the raw all-iterations arrays allows re-aggregating with
/// different percentile bounds (or re-running the peak search) without
/// repeating the expensive bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub tool: String,
    pub created: NaiveDate,
    pub model: ModelKind,
    pub contrasts: Vec<f64>,
    pub runs: Vec<BootRun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_indexing_is_row_major() {
        // 2 subjects x 2 conditions x 3 depths, values 0..12.
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let prof = DepthProfile::new("v1", 2, 2, 3, data).unwrap();
        assert_eq!(prof.value(0, 0, 0), 0.0);
        assert_eq!(prof.value(0, 1, 2), 5.0);
        assert_eq!(prof.value(1, 0, 1), 7.0);
        assert_eq!(prof.value(1, 1, 2), 11.0);
    }

    #[test]
    fn condition_means_average_over_draw() {
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let prof = DepthProfile::new("v1", 2, 2, 3, data).unwrap();
        let mut out = [0.0; 2];
        // Draw contains subject 1 twice: means equal subject 1's values.
        prof.condition_means(&[1, 1], 0, &mut out);
        assert_eq!(out, [6.0, 9.0]);
        // Mixed draw averages the two subjects.
        prof.condition_means(&[0, 1], 2, &mut out);
        assert_eq!(out, [(2.0 + 8.0) / 2.0, (5.0 + 11.0) / 2.0]);
    }

    #[test]
    fn profile_shape_mismatch_is_config_error() {
        let err = DepthProfile::new("v1", 2, 2, 3, vec![0.0; 11]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bounds_validation_rejects_wrong_length() {
        let bounds = ParamBounds {
            lower: vec![0.0, 0.0],
            upper: vec![10.0, 1.0],
        };
        assert!(bounds.validate(ModelKind::Power).is_ok());
        assert!(bounds.validate(ModelKind::Hyper).is_err());
    }

    #[test]
    fn bounds_validation_rejects_inverted_limits() {
        let bounds = ParamBounds {
            lower: vec![0.0, 1.0],
            upper: vec![10.0, 0.5],
        };
        assert!(bounds.validate(ModelKind::Power).is_err());
    }

    #[test]
    fn ci_bounds_validation() {
        assert!(validate_ci_bounds(2.5, 97.5).is_ok());
        assert!(validate_ci_bounds(97.5, 2.5).is_err());
        assert!(validate_ci_bounds(-1.0, 50.0).is_err());
        assert!(validate_ci_bounds(0.0, 101.0).is_err());
    }

    #[test]
    fn contrasts_must_lie_in_unit_interval() {
        assert!(validate_contrasts(&[0.025, 0.061, 0.163, 0.72]).is_ok());
        assert!(validate_contrasts(&[]).is_err());
        assert!(validate_contrasts(&[0.5, 1.2]).is_err());
    }

    #[test]
    fn iter_matrix_serde_round_trips_placeholders() {
        let mut m = IterMatrix::nan_filled(2, 2);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0]);
        let json = serde_json::to_string(&m).unwrap();
        let back: IterMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back.row(0), &[1.0, 2.0]);
        assert!(back.row(1)[0].is_nan());
    }

    #[test]
    fn iter_matrix_rows_and_columns() {
        let mut m = IterMatrix::nan_filled(3, 2);
        m.row_mut(1).copy_from_slice(&[1.0, 2.0]);
        assert!(m.row(0)[0].is_nan());
        assert_eq!(m.row(1), &[1.0, 2.0]);
        let col: Vec<f64> = m.column(1).collect();
        assert!(col[0].is_nan());
        assert_eq!(col[1], 2.0);
        assert!(col[2].is_nan());
    }
}
