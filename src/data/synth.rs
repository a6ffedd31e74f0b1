//! Synthetic depth-profile generation for the `demo` subcommand and tests.
//!
//! Profiles are drawn around a known ground truth: a power-law CRF whose
//! exponent rises toward mid-depth. Since the half-maximum contrast is
//! `0.5^(1/b)`, that puts a mid-cortical peak into the half-max profile,
//! the qualitative shape the real analysis looks for. Per-subject gain and
//! additive Gaussian noise come from a seeded `StdRng` so demo runs are
//! reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DepthProfile, ModelKind};
use crate::error::AppError;
use crate::models::predict;

/// Synthetic-data settings.
#[derive(Debug, Clone)]
pub struct SynthSpec {
    pub regions: usize,
    pub subjects: usize,
    pub depths: usize,
    pub seed: u64,
    /// Additive noise standard deviation, in response units.
    pub noise: f64,
}

/// Generate one profile per region.
pub fn generate_profiles(spec: &SynthSpec, contrasts: &[f64]) -> Result<Vec<DepthProfile>, AppError> {
    if spec.regions == 0 {
        return Err(AppError::config("Demo region count must be > 0."));
    }
    if spec.subjects < 2 {
        return Err(AppError::config("Demo subject count must be >= 2."));
    }
    if spec.depths < 2 {
        return Err(AppError::config("Demo depth count must be >= 2."));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::config(format!(
            "Demo noise level must be non-negative (got {}).",
            spec.noise
        )));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let conditions = contrasts.len();
    let mut out = Vec::with_capacity(spec.regions);
    for r in 0..spec.regions {
        // Later regions respond slightly weaker, mirroring V1 > V2 amplitude.
        let region_gain = 1.0 - 0.15 * r as f64;

        let mut data = Vec::with_capacity(spec.subjects * conditions * spec.depths);
        for _s in 0..spec.subjects {
            let subject_gain = 1.0 + 0.1 * normal.sample(&mut rng);
            for c in 0..conditions {
                for d in 0..spec.depths {
                    let rel = d as f64 / (spec.depths as f64 - 1.0);
                    let truth = ground_truth_params(region_gain * subject_gain, rel);
                    let clean = predict(ModelKind::Power, contrasts[c], &truth);
                    let noise = spec.noise * normal.sample(&mut rng);
                    data.push(clean + noise);
                }
            }
        }

        out.push(DepthProfile::new(
            format!("region-{}", r + 1),
            spec.subjects,
            conditions,
            spec.depths,
            data,
        )?);
    }

    Ok(out)
}

/// Ground-truth power parameters at one relative depth.
///
/// The exponent peaks at mid-depth (0.5 -> 0.65), which moves the
/// half-maximum contrast `0.5^(1/b)` through an interior maximum
/// (0.25 at the boundaries, ~0.34 at mid-depth).
fn ground_truth_params(gain: f64, rel_depth: f64) -> [f64; 2] {
    let bump = (-0.5 * ((rel_depth - 0.5) / 0.2).powi(2)).exp();
    let a = gain * (1.5 + 0.3 * bump);
    let b = 0.5 + 0.15 * bump;
    [a, b]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMP_CONTRASTS: [f64; 4] = [0.025, 0.061, 0.163, 0.72];

    fn spec() -> SynthSpec {
        SynthSpec {
            regions: 2,
            subjects: 8,
            depths: 11,
            seed: 42,
            noise: 0.05,
        }
    }

    #[test]
    fn shapes_match_the_settings() {
        let profiles = generate_profiles(&spec(), &EMP_CONTRASTS).unwrap();
        assert_eq!(profiles.len(), 2);
        for p in &profiles {
            assert_eq!((p.subjects, p.conditions, p.depths), (8, 4, 11));
        }
        assert_eq!(profiles[0].region, "region-1");
    }

    #[test]
    fn generation_is_seed_deterministic() {
        let a = generate_profiles(&spec(), &EMP_CONTRASTS).unwrap();
        let b = generate_profiles(&spec(), &EMP_CONTRASTS).unwrap();
        for (pa, pb) in a.iter().zip(b.iter()) {
            for s in 0..pa.subjects {
                for c in 0..pa.conditions {
                    for d in 0..pa.depths {
                        assert_eq!(pa.value(s, c, d), pb.value(s, c, d));
                    }
                }
            }
        }
    }

    #[test]
    fn noiseless_values_are_finite_and_positive() {
        let mut s = spec();
        s.noise = 0.0;
        let profiles = generate_profiles(&s, &EMP_CONTRASTS).unwrap();
        for p in &profiles {
            for sub in 0..p.subjects {
                for c in 0..p.conditions {
                    for d in 0..p.depths {
                        assert!(p.value(sub, c, d).is_finite());
                    }
                }
            }
        }
    }

    #[test]
    fn invalid_settings_are_config_errors() {
        let mut s = spec();
        s.subjects = 1;
        assert!(generate_profiles(&s, &EMP_CONTRASTS).is_err());
        let mut s = spec();
        s.noise = -0.1;
        assert!(generate_profiles(&s, &EMP_CONTRASTS).is_err());
    }
}
