//! Line initial guess.

use crate::domain::{LineParams, Vector2};
use crate::error::FitError;

/// Line through the first and last points.
///
/// Coincident endpoints give a horizontal line through the first point.
pub fn line_guess(data: &[Vector2]) -> Result<LineParams, FitError> {
    let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
        return Err(FitError::EmptyInput);
    };
    let angle = match (last - first).unit() {
        Some(u) => u.angle(),
        None => 0.0,
    };
    let rho = Vector2::from_angle(angle).perp().dot(first);
    Ok(LineParams { angle, rho })
}
