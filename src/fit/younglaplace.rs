//! Young–Laplace (pendant drop) fit entry point.

use tracing::{debug, warn};

use crate::data::drop_profile;
use crate::domain::{SolverConfig, Vector2, YoungLaplaceFitResult, YoungLaplaceParams};
use crate::error::FitError;
use crate::fit::least_squares;
use crate::guess::young_laplace_guess;
use crate::math::wrap_angle;
use crate::models::{ParamModel, YoungLaplaceModel};

/// Fit a pendant drop profile to `data`.
///
/// Starts from [`young_laplace_guess`]. Volume and surface area are integrated up to the
/// furthest fitted point.
pub fn young_laplace_fit(
    data: &[Vector2],
    config: &SolverConfig,
) -> Result<YoungLaplaceFitResult, FitError> {
    FitError::check_len(data.len(), YoungLaplaceParams::LEN)?;
    let x0 = young_laplace_guess(data)?;

    let mut model = YoungLaplaceModel::new(data);
    let solution = least_squares(&mut model, &x0.to_vec(), config).inspect_err(|e| {
        warn!(error = %e, points = data.len(), "young-laplace fit failed");
    })?;
    model.set_params(&solution.params)?;
    let (volume, surface_area) = model.volume_and_area()?;

    let mut params = YoungLaplaceParams::from_slice(&solution.params)?;
    params.rotation = wrap_angle(params.rotation);
    debug!(
        bond = params.bond,
        radius = params.radius,
        objective = solution.objective,
        stop_reason = ?solution.stop_reason,
        "young-laplace fit"
    );

    Ok(YoungLaplaceFitResult {
        params,
        residuals: solution.residuals.clone(),
        arclengths: model.arclengths().to_vec(),
        volume,
        surface_area,
        stats: solution.stats(),
    })
}

impl YoungLaplaceFitResult {
    /// Fitted profile in image coordinates at signed dimensionless arclengths `s`.
    pub fn profile(&self, s: &[f64]) -> Vec<Vector2> {
        drop_profile(&self.params, s)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;
    use crate::data::{add_noise, linspace};

    #[test]
    fn recovers_unit_drop() {
        let truth = YoungLaplaceParams {
            bond: 0.1,
            radius: 1.0,
            apex_x: 0.0,
            apex_y: 0.0,
            rotation: 0.0,
        };
        let data = drop_profile(&truth, &linspace(-2.5, 2.5, 50));
        let fit = young_laplace_fit(&data, &SolverConfig::default()).unwrap();
        let p = fit.params;

        assert!((p.bond - 0.1).abs() < 1e-4, "bond {}", p.bond);
        assert!((p.radius - 1.0).abs() < 1e-3);
        assert!(p.apex_x.abs() < 1e-3 && p.apex_y.abs() < 1e-3);
        assert!(wrap_angle(p.rotation).abs() < 1e-3);
        assert!(fit.stats.objective < 1e-8);
        assert_eq!(fit.arclengths.len(), 50);
        assert!(fit.volume > 0.0 && fit.surface_area > 0.0);
    }

    #[test]
    fn recovers_scaled_rotated_drop() {
        let truth = YoungLaplaceParams {
            bond: 0.25,
            radius: 40.0,
            apex_x: 320.0,
            apex_y: 240.0,
            rotation: 0.3,
        };
        let data = drop_profile(&truth, &linspace(-3.0, 3.0, 120));
        let fit = young_laplace_fit(&data, &SolverConfig::default()).unwrap();
        let p = fit.params;

        assert!((p.bond - truth.bond).abs() < 1e-3, "bond {}", p.bond);
        assert!((p.radius - truth.radius).abs() < 1e-2);
        assert!(p.apex().distance(truth.apex()) < 1e-2);
        assert!(wrap_angle(p.rotation - truth.rotation).abs() < 1e-3);
        assert!(p.rotation >= -TAU / 2.0 && p.rotation < TAU / 2.0);

        // The fitted curve passes through the data.
        let curve = fit.profile(&fit.arclengths);
        for (a, b) in curve.iter().zip(&data) {
            assert!(a.distance(*b) < 1e-2);
        }
    }

    #[test]
    fn noisy_drop_stays_close() {
        let truth = YoungLaplaceParams {
            bond: 0.2,
            radius: 50.0,
            apex_x: 200.0,
            apex_y: 100.0,
            rotation: 0.0,
        };
        let mut data = drop_profile(&truth, &linspace(-3.0, 3.0, 200));
        add_noise(&mut data, 0.2, 42).unwrap();
        let fit = young_laplace_fit(&data, &SolverConfig::default()).unwrap();
        assert!((fit.params.bond - 0.2).abs() < 0.02);
        assert!((fit.params.radius - 50.0).abs() < 0.5);
        let rms = (fit.residuals.iter().map(|r| r * r).sum::<f64>() / 200.0).sqrt();
        assert!(rms < 0.3, "rms {rms}");
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            young_laplace_fit(&[], &SolverConfig::default()),
            Err(FitError::EmptyInput)
        );
    }
}
