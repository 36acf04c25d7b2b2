//! Circle initial guesses.

use nalgebra::{DMatrix, DVector};

use crate::domain::{CircleParams, Vector2, centroid};
use crate::error::FitError;
use crate::math::{median, solve_least_squares};

/// Centroid of `data`, with the median point distance as radius.
pub fn circle_guess(data: &[Vector2]) -> Result<CircleParams, FitError> {
    let c = centroid(data).ok_or(FitError::EmptyInput)?;
    let dists: Vec<f64> = data.iter().map(|p| p.distance(c)).collect();
    let radius = median(&dists).ok_or(FitError::EmptyInput)?;
    Ok(CircleParams::new(c, radius))
}

/// Algebraic (Kåsa) circle, falling back to [`circle_guess`].
///
/// Solves `x² + y² + D x + E y + F = 0` in the least-squares sense on centred data.
/// Exact for noiseless points and much closer than the centroid on short arcs.
pub fn algebraic_circle_guess(data: &[Vector2]) -> Result<CircleParams, FitError> {
    let c = centroid(data).ok_or(FitError::EmptyInput)?;
    match algebraic_circle(data, c) {
        Some(p) => Ok(p),
        None => circle_guess(data),
    }
}

fn algebraic_circle(data: &[Vector2], c: Vector2) -> Option<CircleParams> {
    if data.len() < 3 {
        return None;
    }
    let n = data.len();
    let mut x = DMatrix::<f64>::zeros(n, 3);
    let mut y = DVector::<f64>::zeros(n);
    for (i, &p) in data.iter().enumerate() {
        let d = p - c;
        x[(i, 0)] = d.x;
        x[(i, 1)] = d.y;
        x[(i, 2)] = 1.0;
        y[i] = -d.norm_squared();
    }
    let beta = solve_least_squares(&x, &y)?;
    let center = Vector2::new(-0.5 * beta[0], -0.5 * beta[1]);
    let r2 = center.norm_squared() - beta[2];
    if !(r2 > 0.0 && r2.is_finite()) {
        return None;
    }
    Some(CircleParams::new(c + center, r2.sqrt()))
}
