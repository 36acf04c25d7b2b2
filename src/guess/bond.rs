//! Bond number estimate from the drop width at the "selected plane", two apex radii up.

use tracing::debug;

use crate::domain::Vector2;
use crate::guess::PendantApex;
use crate::math::mean;

/// Returned when the contour never reaches the selected plane.
pub const DEFAULT_BOND: f64 = 0.15;

const PLANE_HEIGHT: f64 = 2.0;
const PLANE_HALF_WIDTH: f64 = 0.05;

// Polynomial in the normalized plane radius, no constant or linear term.
const COEFFS: [f64; 3] = [0.1756, 0.5234, -0.2563];

/// Bond number from the mean half-width of the contour near `z = 2R`.
///
/// Points are taken in the drop frame of `apex`. If no point reaches the plane, or the
/// band around it is empty, [`DEFAULT_BOND`] is returned.
pub fn bond_selected_plane(data: &[Vector2], apex: &PendantApex) -> f64 {
    let radius = apex.radius;
    let u_r = Vector2::from_angle(apex.rotation);
    let u_z = u_r.perp();

    let mut rz: Vec<(f64, f64)> = data
        .iter()
        .map(|&p| {
            let d = p - apex.apex;
            (u_r.dot(d), u_z.dot(d))
        })
        .collect();
    rz.sort_by(|a, b| a.1.total_cmp(&b.1));

    if !rz.last().is_some_and(|&(_, z)| z >= PLANE_HEIGHT * radius) {
        return DEFAULT_BOND;
    }

    let lo = (PLANE_HEIGHT - PLANE_HALF_WIDTH) * radius;
    let hi = (PLANE_HEIGHT + PLANE_HALF_WIDTH) * radius;
    let widths: Vec<f64> = rz
        .iter()
        .filter(|&&(_, z)| z >= lo && z <= hi)
        .map(|&(r, _)| r.abs())
        .collect();

    let Some(width) = mean(&widths) else {
        return DEFAULT_BOND;
    };
    let r = width / radius;
    let bond = COEFFS[0] * r.powi(2) + COEFFS[1] * r.powi(3) + COEFFS[2] * r.powi(4);
    debug!(plane_points = widths.len(), plane_radius = r, bond, "selected plane");
    bond
}
