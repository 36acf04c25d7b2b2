//! Contact angles of a sessile drop from the contour near each contact point.
//!
//! The contour is moved into baseline coordinates, `r` along the baseline and `z` away
//! from it, and split at the mean `r` into a left and a right side. Each side is fitted
//! near its lowest point: a straight line first, then a circular arc when too many line
//! residuals are large. The arc is used only if it actually crosses the baseline.
//!
//! Angles are measured inside the drop. The right side's angle is reflected, `π − θ`, so
//! a symmetric drop reports the same angle on both sides.
//!
//! Each side is fitted on its own. A side that cannot be fitted is reported as an error in
//! the result; the call itself fails only when neither side can be fitted.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::{debug, warn};

use crate::domain::{
    ArcBranch, ArcFit, ContactAngleConfig, ContactAngleFitResult, FitStats, Line2, LineParams,
    Rect2, Vector2,
};
use crate::error::FitError;
use crate::fit::{circle_fit, line_fit};
use crate::guess::algebraic_circle_guess;
use crate::math::{mean, wrap_angle};

/// Below this `|sin θ|` a fitted line is taken as parallel to the baseline.
const PARALLEL_TOL: f64 = 1e-8;

/// Arc fit in baseline coordinates, points in the order they were fitted.
#[derive(Debug, Clone)]
struct LocalArc {
    branch: ArcBranch,
    angle: f64,
    curvature: f64,
    contact: Option<f64>,
    center: Option<Vector2>,
    residuals: Vec<f64>,
    arclengths: Vec<f64>,
    stats: FitStats,
}

/// Baseline frame: origin at the baseline's first point, `z` towards the drop.
#[derive(Debug, Clone, Copy)]
struct Frame {
    origin: Vector2,
    unit: Vector2,
    perp: Vector2,
}

impl Frame {
    fn to_local(&self, p: Vector2) -> Vector2 {
        let d = p - self.origin;
        Vector2::new(self.unit.dot(d), self.perp.dot(d))
    }

    fn to_image(&self, p: Vector2) -> Vector2 {
        self.origin + self.unit * p.x + self.perp * p.y
    }
}

/// Left and right contact fits of `data` against `baseline`.
pub fn contact_angle_fit(
    data: &[Vector2],
    baseline: &Line2,
    config: &ContactAngleConfig,
) -> Result<ContactAngleFitResult, FitError> {
    FitError::check_len(data.len(), 2 * LineParams::LEN)?;

    let mut frame = Frame {
        origin: baseline.p0(),
        unit: baseline.unit(),
        perp: baseline.perp(),
    };
    let mut rz: Vec<Vector2> = data.iter().map(|&p| frame.to_local(p)).collect();
    let bounds = Rect2::bounding(&rz).ok_or(FitError::EmptyInput)?;
    if !(bounds.width() > 0.0) {
        return Err(FitError::DegenerateGeometry(
            "contour has no extent along the baseline".into(),
        ));
    }
    if bounds.y0.abs() > bounds.y1.abs() {
        // Drop lies on the negative side of the baseline.
        frame.perp = -frame.perp;
        rz.iter_mut().for_each(|p| p.y = -p.y);
    }

    let mut by_height: Vec<usize> = (0..rz.len()).collect();
    by_height.sort_by(|&a, &b| rz[a].y.total_cmp(&rz[b].y));
    let rc = mean(&rz.iter().map(|p| p.x).collect::<Vec<_>>()).ok_or(FitError::EmptyInput)?;
    let (left, right): (Vec<usize>, Vec<usize>) =
        by_height.iter().copied().partition(|&i| rz[i].x < rc);
    let (Some(&l0), Some(&r0)) = (left.first(), right.first()) else {
        return Err(FitError::DegenerateGeometry("contour has only one side".into()));
    };

    let base_width = rz[r0].x - rz[l0].x;
    let reach = config.contact_neighbourhood * base_width;
    let near = |side: &[usize], contact: Vector2| -> Vec<usize> {
        side.iter()
            .copied()
            .filter(|&i| rz[i].distance(contact) < reach)
            .collect()
    };
    let left = near(&left, rz[l0]);
    let right = near(&right, rz[r0]);
    debug!(
        base_width,
        left_points = left.len(),
        right_points = right.len(),
        "contact neighbourhoods"
    );

    let left = side_fit(&rz, &left, &frame, config).inspect_err(|e| {
        warn!(error = %e, "left contact fit failed");
    });
    let right = side_fit(&rz, &right, &frame, config)
        .map(|mut fit| {
            fit.angle = PI - fit.angle;
            fit
        })
        .inspect_err(|e| {
            warn!(error = %e, "right contact fit failed");
        });

    if let (Err(e), Err(_)) = (&left, &right) {
        return Err(e.clone());
    }
    Ok(ContactAngleFitResult { left, right })
}

/// Fit the points `ix` (z-sorted indices into `rz`) and report in image coordinates.
fn side_fit(
    rz: &[Vector2],
    ix: &[usize],
    frame: &Frame,
    config: &ContactAngleConfig,
) -> Result<ArcFit, FitError> {
    let points: Vec<Vector2> = ix.iter().map(|&i| rz[i]).collect();
    let arc = arc_fit(&points, config)?;

    let mut mask = vec![false; rz.len()];
    ix.iter().for_each(|&i| mask[i] = true);

    let mut by_input: Vec<(usize, f64, f64)> = ix
        .iter()
        .zip(arc.residuals.iter().zip(&arc.arclengths))
        .map(|(&i, (&res, &s))| (i, res, s))
        .collect();
    by_input.sort_by_key(|&(i, _, _)| i);

    Ok(ArcFit {
        branch: arc.branch,
        angle: arc.angle,
        curvature: arc.curvature,
        contact: arc.contact.map(|x| frame.to_image(Vector2::new(x, 0.0))),
        center: arc.center.map(|c| frame.to_image(c)),
        residuals: by_input.iter().map(|&(_, r, _)| r).collect(),
        arclengths: by_input.iter().map(|&(_, _, s)| s).collect(),
        mask,
        stats: arc.stats,
    })
}

/// Line first; a circle when more than the allowed fraction of line residuals is large
/// and the circle meets the baseline.
fn arc_fit(points: &[Vector2], config: &ContactAngleConfig) -> Result<LocalArc, FitError> {
    let line = line_fit(points, &config.line)?;

    let large = line
        .residuals
        .iter()
        .filter(|r| r.abs() >= config.line_residual_threshold)
        .count();
    if large as f64 > config.arc_fallback_fraction * points.len() as f64 {
        match circle_branch(points, config) {
            Ok(arc) => return Ok(arc),
            Err(e) => debug!(error = %e, large, "keeping line fit"),
        }
    }

    let angle = line.params.angle.rem_euclid(PI);
    let unit = Vector2::from_angle(angle);
    let on_line = unit.perp() * line.params.rho;
    let contact = (unit.y.abs() > PARALLEL_TOL).then(|| on_line.x - unit.x / unit.y * on_line.y);
    let start = contact.map_or(on_line, |x| Vector2::new(x, 0.0));

    Ok(LocalArc {
        branch: ArcBranch::Line,
        angle,
        curvature: 0.0,
        contact,
        center: None,
        residuals: line.residuals,
        arclengths: points.iter().map(|&p| unit.dot(p - start)).collect(),
        stats: line.stats,
    })
}

fn circle_branch(points: &[Vector2], config: &ContactAngleConfig) -> Result<LocalArc, FitError> {
    let start = algebraic_circle_guess(points)?;
    let fit = circle_fit(points, Some(start), &config.circle)?;
    let center = fit.params.center();
    let radius = fit.params.radius;
    let half_chord = baseline_half_chord(center, radius)?;

    // The crossing nearest the fitted points.
    let gap = |x: f64| {
        let c = Vector2::new(x, 0.0);
        points
            .iter()
            .map(|p| p.distance(c))
            .fold(f64::INFINITY, f64::min)
    };
    let (a, b) = (center.x - half_chord, center.x + half_chord);
    let contact = if gap(a) < gap(b) { a } else { b };

    let q = center.y.atan2(center.x - contact);
    let angle = (q + FRAC_PI_2).rem_euclid(PI);

    let inside = if center.x == contact {
        points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64 > contact
    } else {
        center.x > contact
    };
    let curvature = if inside { -1.0 / radius } else { 1.0 / radius };

    let arclengths = points
        .iter()
        .map(|p| {
            let mut turn = (center.y - p.y).atan2(center.x - p.x) - q;
            if curvature < 0.0 {
                turn = -turn;
            }
            // Points just before the contact come out slightly negative, not near 2πR.
            radius * wrap_angle(turn)
        })
        .collect();

    Ok(LocalArc {
        branch: ArcBranch::Circle,
        angle,
        curvature,
        contact: Some(contact),
        center: Some(center),
        residuals: fit.residuals,
        arclengths,
        stats: fit.stats,
    })
}

/// Half the chord cut from the baseline `z = 0` by a circle.
fn baseline_half_chord(center: Vector2, radius: f64) -> Result<f64, FitError> {
    if center.y.abs() > radius {
        return Err(FitError::NonIntersectingGeometry);
    }
    Ok((radius * radius - center.y * center.y).sqrt())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::{circle_arc, linspace};

    fn baseline() -> Line2 {
        Line2::new(Vector2::new(-200.0, 0.0), Vector2::new(200.0, 0.0)).unwrap()
    }

    fn cap(center_y: f64, flip: bool) -> Vec<Vector2> {
        let angles = linspace((-30.0f64).to_radians(), 210.0f64.to_radians(), 200);
        let mut points = circle_arc(Vector2::new(0.0, center_y), 100.0, &angles);
        if flip {
            points.iter_mut().for_each(|p| p.y = -p.y);
        }
        points
    }

    fn sides(fit: &ContactAngleFitResult) -> (&ArcFit, &ArcFit) {
        (fit.left.as_ref().unwrap(), fit.right.as_ref().unwrap())
    }

    fn wedge() -> Vec<Vector2> {
        let d = Vector2::from_angle(FRAC_PI_2 / 2.0);
        let mut points = Vec::new();
        for t in linspace(0.0, 8.0, 50) {
            points.push(Vector2::new(-10.0 + d.x * t, d.y * t));
            points.push(Vector2::new(10.0 - d.x * t, d.y * t));
        }
        points
    }

    #[test]
    fn circular_cap_gives_analytic_angle() {
        let data = cap(50.0, false);
        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        let expected = 120.0f64.to_radians();

        for side in [left, right] {
            assert_eq!(side.branch, ArcBranch::Circle);
            assert_relative_eq!(side.angle, expected, epsilon = 1e-6);
            assert_relative_eq!(side.curvature.abs(), 0.01, epsilon = 1e-8);
            let center = side.center.unwrap();
            assert!(center.distance(Vector2::new(0.0, 50.0)) < 1e-6);
        }
        let half_base = 75.0f64.sqrt() * 10.0;
        assert!(left.contact.unwrap().distance(Vector2::new(-half_base, 0.0)) < 1e-6);
        assert!(right.contact.unwrap().distance(Vector2::new(half_base, 0.0)) < 1e-6);
        assert!(left.curvature < 0.0 && right.curvature > 0.0);
    }

    #[test]
    fn drop_below_baseline_is_flipped() {
        let data = cap(50.0, true);
        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        let expected = 120.0f64.to_radians();
        assert_relative_eq!(left.angle, expected, epsilon = 1e-6);
        assert_relative_eq!(right.angle, expected, epsilon = 1e-6);
        assert!(left.center.unwrap().distance(Vector2::new(0.0, -50.0)) < 1e-6);
    }

    #[test]
    fn arclengths_grow_away_from_contact() {
        let data = cap(50.0, false);
        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        for side in [left, right] {
            let fitted: Vec<Vector2> = data
                .iter()
                .zip(&side.mask)
                .filter(|&(_, &m)| m)
                .map(|(&p, _)| p)
                .collect();
            assert_eq!(fitted.len(), side.arclengths.len());
            assert_eq!(fitted.len(), side.residuals.len());
            for (p, s) in fitted.iter().zip(&side.arclengths) {
                // Close to the baseline the arc is nearly straight.
                assert!(*s > -1e-6 && *s < 60.0, "s {s} at {p:?}");
                assert!(*s >= p.y - 1e-6);
            }
        }
    }

    #[test]
    fn masks_follow_input_order() {
        let data = cap(50.0, false);
        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        assert_eq!(left.mask.len(), data.len());
        for (p, (&l, &r)) in data.iter().zip(left.mask.iter().zip(&right.mask)) {
            assert!(!(l && r));
            if l {
                assert!(p.x < 0.0);
            }
            if r {
                assert!(p.x > 0.0);
            }
        }
        // Input order: angles run right to left, so the right contact comes first.
        assert!(right.mask[0] && left.mask[data.len() - 1]);
    }

    #[test]
    fn straight_wedge_takes_line_branch() {
        let data = wedge();
        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        let expected = 45.0f64.to_radians();

        assert_eq!(left.branch, ArcBranch::Line);
        assert_eq!(right.branch, ArcBranch::Line);
        assert_relative_eq!(left.angle, expected, epsilon = 1e-8);
        assert_relative_eq!(right.angle, expected, epsilon = 1e-8);
        assert!(left.contact.unwrap().distance(Vector2::new(-10.0, 0.0)) < 1e-6);
        assert!(right.contact.unwrap().distance(Vector2::new(10.0, 0.0)) < 1e-6);
        assert_eq!(left.curvature, 0.0);
        assert!(left.center.is_none());
    }

    #[test]
    fn sparse_side_keeps_the_other() {
        let d = Vector2::from_angle(FRAC_PI_2 / 2.0);
        let mut data: Vec<Vector2> = linspace(0.0, 8.0, 50)
            .into_iter()
            .map(|t| Vector2::new(-10.0 + d.x * t, d.y * t))
            .collect();
        data.push(Vector2::new(150.0, 0.0));

        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let left = fit.left.as_ref().unwrap();
        assert_eq!(left.branch, ArcBranch::Line);
        assert_relative_eq!(left.angle, 45.0f64.to_radians(), epsilon = 1e-8);
        assert!(left.contact.unwrap().distance(Vector2::new(-10.0, 0.0)) < 1e-6);
        assert_eq!(
            fit.right,
            Err(FitError::InsufficientData { needed: 2, got: 1 })
        );
    }

    #[test]
    fn fails_only_when_both_sides_fail() {
        let data = [
            Vector2::new(-10.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(-1.0, 100.0),
            Vector2::new(1.0, 100.0),
        ];
        assert_eq!(
            contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()),
            Err(FitError::InsufficientData { needed: 2, got: 1 })
        );
    }

    #[test]
    fn circle_missing_baseline_keeps_line() {
        let angles = linspace(200.0f64.to_radians(), 340.0f64.to_radians(), 40);
        let mut data = circle_arc(Vector2::new(-50.0, 30.0), 10.0, &angles);
        let mirrored: Vec<Vector2> = data.iter().map(|p| Vector2::new(-p.x, p.y)).collect();
        data.extend(mirrored);

        let fit = contact_angle_fit(&data, &baseline(), &ContactAngleConfig::default()).unwrap();
        let (left, right) = sides(&fit);
        for side in [left, right] {
            // Residuals of the straight line are well above the threshold.
            assert!(side.residuals.iter().any(|r| r.abs() > 1.0));
            assert_eq!(side.branch, ArcBranch::Line);
            assert_eq!(side.curvature, 0.0);
            assert!(side.center.is_none());
        }
    }

    #[test]
    fn circle_above_baseline_does_not_intersect() {
        assert_eq!(
            baseline_half_chord(Vector2::new(0.0, 150.0), 100.0),
            Err(FitError::NonIntersectingGeometry)
        );
        assert_relative_eq!(
            baseline_half_chord(Vector2::new(3.0, 60.0), 100.0).unwrap(),
            80.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn degenerate_inputs() {
        let config = ContactAngleConfig::default();
        assert_eq!(
            contact_angle_fit(&[], &baseline(), &config),
            Err(FitError::EmptyInput)
        );
        let column: Vec<Vector2> = (0..10).map(|i| Vector2::new(5.0, i as f64)).collect();
        assert!(matches!(
            contact_angle_fit(&column, &baseline(), &config),
            Err(FitError::DegenerateGeometry(_))
        ));
        assert!(Line2::new(Vector2::ZERO, Vector2::ZERO).is_err());
    }
}
