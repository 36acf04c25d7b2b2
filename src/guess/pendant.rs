//! Apex, radius and orientation estimate for a pendant drop contour.
//!
//! The procedure:
//!
//! 1. robust circle fit to the whole contour (Cauchy loss, so the neck and needle are
//!    ignored)
//! 2. keep the "bowl": points whose circle residual is within 10× the median
//! 3. take the symmetry axis from the bowl's inertia tensor, choosing the principal axis
//!    along which the bowl is less spread out
//! 4. orient the axis so points pile up near low `z` (the apex end)
//! 5. refit the circle on the apex arc, `|r| ≤ 0.3 R`, when it has enough points

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CircleParams, Loss, SolverConfig, Vector2, centroid};
use crate::error::FitError;
use crate::fit::circle_fit;
use crate::math::{histogram, mean, median, moving_average, wrap_angle};

/// Fraction of the radius spanned by the apex arc.
pub const APEX_ARC_HALF_WIDTH: f64 = 0.3;
/// Bowl points have circle residuals below this multiple of the median residual.
pub const BOWL_RESIDUAL_FACTOR: f64 = 10.0;
const MIN_APEX_ARC_POINTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendantApex {
    pub apex: Vector2,
    pub radius: f64,
    /// Angle of the drop's `r` axis from the image `x` axis, in `[-π, π)`.
    pub rotation: f64,
}

pub fn find_pendant_apex(data: &[Vector2]) -> Result<PendantApex, FitError> {
    FitError::check_len(data.len(), 3)?;

    let c0 = centroid(data).ok_or(FitError::EmptyInput)?;
    let r0 = mean(&data.iter().map(|p| p.distance(c0)).collect::<Vec<_>>())
        .ok_or(FitError::EmptyInput)?;
    if !(r0 > 0.0) {
        return Err(FitError::DegenerateGeometry("contour has no spatial extent".into()));
    }

    let robust = SolverConfig::default()
        .with_loss(Loss::Cauchy, r0 / 100.0)
        .with_max_iterations(100);
    let fit = circle_fit(data, Some(CircleParams::new(c0, r0)), &robust)?;
    let center = fit.params.center();
    let mut radius = fit.params.radius.abs();

    let abs_res: Vec<f64> = fit.residuals.iter().map(|r| r.abs()).collect();
    let cutoff = BOWL_RESIDUAL_FACTOR * median(&abs_res).unwrap_or(0.0);
    let mut bowl: Vec<Vector2> = data
        .iter()
        .zip(&abs_res)
        .filter(|&(_, &r)| r <= cutoff)
        .map(|(&p, _)| p)
        .collect();
    if bowl.len() < 3 {
        bowl = data.to_vec();
    }

    let mut rotation = inertia_axis(&bowl);
    let u_r = Vector2::from_angle(rotation);
    let mut u_z = u_r.perp();
    let mut bowl_r: Vec<f64> = bowl.iter().map(|&p| u_r.dot(p - center)).collect();
    let mut bowl_z: Vec<f64> = bowl.iter().map(|&p| u_z.dot(p - center)).collect();

    if axis_spread(&bowl_z) > axis_spread(&bowl_r) {
        // Swap axes so z is the symmetry axis.
        rotation -= FRAC_PI_2;
        u_z = u_r;
        let neg_z: Vec<f64> = bowl_z.iter().map(|z| -z).collect();
        (bowl_r, bowl_z) = (neg_z, bowl_r);
    }

    let hist = histogram(&bowl_z, 2 + bowl_z.len() / 10);
    if argmax(&hist) as f64 > hist.len() as f64 / 2.0 {
        // Points accumulate where dz/ds ~ 0; that end should be the apex at low z.
        rotation += PI;
        u_z = -u_z;
        bowl_r.iter_mut().for_each(|r| *r = -*r);
        bowl_z.iter_mut().for_each(|z| *z = -*z);
    }

    let mut by_z: Vec<usize> = (0..bowl.len()).collect();
    by_z.sort_by(|&a, &b| bowl_z[a].total_cmp(&bowl_z[b]));
    let arc_len = by_z.partition_point(|&i| bowl_r[i].abs() <= APEX_ARC_HALF_WIDTH * radius);
    let mut center = center;
    if arc_len > MIN_APEX_ARC_POINTS {
        let arc: Vec<Vector2> = by_z[..arc_len].iter().map(|&i| bowl[i]).collect();
        let refit = circle_fit(
            &arc,
            Some(CircleParams::new(center, radius)),
            &SolverConfig::default().with_max_iterations(100),
        )?;
        center = refit.params.center();
        radius = refit.params.radius.abs();
    }

    let apex = center - u_z * radius;
    let rotation = wrap_angle(rotation);
    debug!(apex_x = apex.x, apex_y = apex.y, radius, rotation, arc_points = arc_len, "pendant apex");

    Ok(PendantApex {
        apex,
        radius,
        rotation,
    })
}

/// Principal-axis angle of a point set from its 2×2 inertia tensor.
fn inertia_axis(points: &[Vector2]) -> f64 {
    let c = centroid(points).unwrap_or(Vector2::ZERO);
    let (mut ixx, mut iyy, mut ixy) = (0.0, 0.0, 0.0);
    for &p in points {
        let d = p - c;
        ixx += d.y * d.y;
        iyy += d.x * d.x;
        ixy -= d.x * d.y;
    }
    0.5 * (2.0 * ixy).atan2(ixx - iyy)
}

/// Energy of the smoothed, sorted, centred values (moving average over a tenth of them).
fn axis_spread(values: &[f64]) -> f64 {
    let m = mean(values).unwrap_or(0.0);
    let mut centred: Vec<f64> = values.iter().map(|v| v - m).collect();
    centred.sort_by(f64::total_cmp);
    moving_average(&centred, values.len() / 10)
        .iter()
        .map(|v| v * v)
        .sum()
}

fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{drop_profile, linspace};
    use crate::domain::YoungLaplaceParams;

    fn check(truth: YoungLaplaceParams) {
        let data = drop_profile(&truth, &linspace(-3.0, 3.0, 200));
        let found = find_pendant_apex(&data).unwrap();

        assert!(
            found.apex.distance(truth.apex()) < 0.1 * truth.radius,
            "apex {:?} vs {:?}",
            found.apex,
            truth.apex()
        );
        assert!((found.radius - truth.radius).abs() < 0.15 * truth.radius);
        assert!(wrap_angle(found.rotation - truth.rotation).abs() < 0.15);
        assert!(found.rotation >= -PI && found.rotation < PI);
    }

    #[test]
    fn finds_upright_drop() {
        check(YoungLaplaceParams {
            bond: 0.2,
            radius: 40.0,
            apex_x: 320.0,
            apex_y: 240.0,
            rotation: 0.0,
        });
    }

    #[test]
    fn finds_tilted_and_inverted_drops() {
        for rotation in [0.3, PI - 0.2, -2.0] {
            check(YoungLaplaceParams {
                bond: 0.25,
                radius: 40.0,
                apex_x: 320.0,
                apex_y: 240.0,
                rotation,
            });
        }
    }

    #[test]
    fn spread_orders_axes() {
        let wide: Vec<f64> = (-20..=20).map(|i| i as f64).collect();
        let narrow: Vec<f64> = wide.iter().map(|v| 0.05 * v * v).collect();
        assert!(axis_spread(&wide) > axis_spread(&narrow));
    }
}
