//! Dense linear solves used by the nonlinear least-squares drivers.
//!
//! Both drivers only ever see tiny systems (2–5 parameters), so we favour robustness
//! over speed:
//! - rectangular least squares goes through SVD with a tolerance ladder
//! - symmetric normal equations try Cholesky first and fall back to the SVD path

use nalgebra::{DMatrix, DVector};

/// Solve `min ‖x β − y‖` using SVD.
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

/// Solve the symmetric system `a δ = b`.
pub fn solve_symmetric(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(chol) = a.clone().cholesky() {
        let delta = chol.solve(b);
        if delta.iter().all(|v| v.is_finite()) {
            return Some(delta);
        }
    }
    solve_least_squares(a, b)
}

/// Infinity norm (max absolute row sum) of `a⁻¹`, if `a` is invertible.
pub fn inverse_norm_inf(a: &DMatrix<f64>) -> Option<f64> {
    let inv = a.clone().try_inverse()?;
    let norm = inv
        .row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);
    norm.is_finite().then_some(norm)
}
