//! Least squares solver.
//!
//! In this project we repeatedly solve tiny linear regression problems of the
//! form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Both CRF variants are linear in their amplitude parameter given fixed
//! shape parameters, so during the shape grid search the amplitude is solved
//! many times against a single-column design of basis values.
//!
//! Implementation choices:
//! - SVD solves the least-squares problem robustly even when the design is
//!   tall (more observations than columns) or near-degenerate (a basis
//!   column that is almost all zeros at low contrasts).
//! - With 4-ish observations and one column, SVD cost is negligible against
//!   the surrounding grid search.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
