//! Synthetic contour generation.
//!
//! Deterministic point sets for known parameters, with optional seeded Gaussian noise.
//! Useful for calibration runs and for checking that a fit recovers what went in.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{NeedleParams, Vector2, YoungLaplaceParams};
use crate::error::FitError;
use crate::shape::YoungLaplaceShape;

/// `n` evenly spaced values over `[start, end]`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Drop contour in image coordinates at the given signed dimensionless arclengths.
pub fn drop_profile(params: &YoungLaplaceParams, arclengths: &[f64]) -> Vec<Vector2> {
    let mut shape = YoungLaplaceShape::new(params.bond);
    let u_r = Vector2::from_angle(params.rotation);
    let u_z = u_r.perp();
    arclengths
        .iter()
        .map(|&s| {
            let (r, z) = shape.point(s);
            params.apex() + (u_r * r + u_z * z) * params.radius
        })
        .collect()
}

/// Points on a circle at the given polar angles (radians).
pub fn circle_arc(center: Vector2, radius: f64, angles: &[f64]) -> Vec<Vector2> {
    angles
        .iter()
        .map(|&a| center + Vector2::from_angle(a) * radius)
        .collect()
}

/// `n` evenly spaced points from `p0` to `p1` inclusive.
pub fn line_segment(p0: Vector2, p1: Vector2, n: usize) -> Vec<Vector2> {
    linspace(0.0, 1.0, n)
        .into_iter()
        .map(|t| p0 + (p1 - p0) * t)
        .collect()
}

/// Both needle edges, `n_per_edge` points each, spanning `length` along the axis.
///
/// Axis position zero is the foot of the perpendicular from the origin.
pub fn needle_edges(params: &NeedleParams, length: f64, n_per_edge: usize) -> Vec<Vector2> {
    let n = params.normal();
    let u = params.axis();
    let mut points = Vec::with_capacity(2 * n_per_edge);
    for t in linspace(0.0, length, n_per_edge) {
        points.push(n * (params.rho - params.radius) + u * t);
        points.push(n * (params.rho + params.radius) + u * t);
    }
    points
}

/// Add isotropic Gaussian noise with standard deviation `sigma`, seeded for
/// reproducibility.
pub fn add_noise(points: &mut [Vector2], sigma: f64, seed: u64) -> Result<(), FitError> {
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Err(FitError::InvalidConfig(format!(
            "noise sigma must be non-negative, got {sigma}"
        )));
    }
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| FitError::InvalidConfig(format!("noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);
    for p in points.iter_mut() {
        p.x += normal.sample(&mut rng);
        p.y += normal.sample(&mut rng);
    }
    Ok(())
}
