//! Needle fit entry point.

use tracing::warn;

use crate::domain::{NeedleFitResult, NeedleParams, SolverConfig, Vector2};
use crate::error::FitError;
use crate::fit::least_squares;
use crate::guess::needle_guess;
use crate::models::NeedleModel;

/// Fit two parallel edges to `data`, starting from the projection-sweep guess.
///
/// Use [`FitConfig::default().needle`](crate::domain::FitConfig) for the usual robust
/// trust-region setup.
pub fn needle_fit(data: &[Vector2], config: &SolverConfig) -> Result<NeedleFitResult, FitError> {
    FitError::check_len(data.len(), NeedleParams::LEN)?;
    let x0 = needle_guess(data)?;

    let mut model = NeedleModel::new(data);
    let solution = least_squares(&mut model, &x0.to_vec(), config).inspect_err(|e| {
        warn!(error = %e, points = data.len(), "needle fit failed");
    })?;

    let mut params = NeedleParams::from_slice(&solution.params)?;
    params.radius = params.radius.abs();
    Ok(NeedleFitResult {
        params,
        residuals: solution.residuals.clone(),
        left_mask: model.left_mask(),
        stats: solution.stats(),
    })
}

impl NeedleFitResult {
    /// Corners of the needle rectangle spanned by the inlier points along the axis.
    ///
    /// Inliers are points of `data` (the fitted points, in order) with
    /// `|residual| <= inlier_tol`. The corners run left-low, right-low, right-high,
    /// left-high in axis coordinates. `None` without inliers.
    pub fn tip_rect(&self, data: &[Vector2], inlier_tol: f64) -> Option<[Vector2; 4]> {
        let axis = self.params.axis();
        let (lo, hi) = data
            .iter()
            .zip(&self.residuals)
            .filter(|&(_, r)| r.abs() <= inlier_tol)
            .map(|(&p, _)| axis.dot(p))
            .fold(None, |acc: Option<(f64, f64)>, t| match acc {
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
                None => Some((t, t)),
            })?;

        let n = self.params.normal();
        let left = n * (self.params.rho - self.params.radius);
        let right = n * (self.params.rho + self.params.radius);
        Some([left + axis * lo, right + axis * lo, right + axis * hi, left + axis * hi])
    }
}
