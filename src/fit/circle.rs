//! Circle fit entry point.

use tracing::warn;

use crate::domain::{CircleFitResult, CircleParams, SolverConfig, Vector2};
use crate::error::FitError;
use crate::fit::least_squares;
use crate::guess::circle_guess;
use crate::models::CircleModel;

/// Fit a circle to `data`, starting from `initial` or the centroid guess.
pub fn circle_fit(
    data: &[Vector2],
    initial: Option<CircleParams>,
    config: &SolverConfig,
) -> Result<CircleFitResult, FitError> {
    FitError::check_len(data.len(), CircleParams::LEN)?;
    let x0 = match initial {
        Some(p) => p,
        None => circle_guess(data)?,
    };

    let mut model = CircleModel::new(data);
    let solution = least_squares(&mut model, &x0.to_vec(), config).inspect_err(|e| {
        warn!(error = %e, points = data.len(), "circle fit failed");
    })?;

    let mut params = CircleParams::from_slice(&solution.params)?;
    params.radius = params.radius.abs();
    Ok(CircleFitResult {
        params,
        residuals: solution.residuals.clone(),
        stats: solution.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{add_noise, circle_arc, linspace};

    #[test]
    fn recovers_exact_circle() {
        let data = circle_arc(Vector2::new(5.0, 5.0), 3.0, &linspace(0.0, 5.0, 30));
        let fit = circle_fit(&data, None, &SolverConfig::default()).unwrap();
        assert!((fit.params.center_x - 5.0).abs() < 1e-8);
        assert!((fit.params.center_y - 5.0).abs() < 1e-8);
        assert!((fit.params.radius - 3.0).abs() < 1e-8);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-8));
        assert!(fit.stats.objective < 1e-12);
    }

    #[test]
    fn noisy_circle_from_poor_start() {
        let mut data = circle_arc(Vector2::new(-20.0, 10.0), 15.0, &linspace(0.0, 6.0, 100));
        add_noise(&mut data, 0.1, 3).unwrap();
        let start = CircleParams::new(Vector2::new(-10.0, 0.0), 5.0);
        let fit = circle_fit(&data, Some(start), &SolverConfig::default()).unwrap();
        assert!(fit.params.center().distance(Vector2::new(-20.0, 10.0)) < 0.1);
        assert!((fit.params.radius - 15.0).abs() < 0.1);
        assert!(fit.stats.stop_reason.converged());
    }

    #[test]
    fn empty_and_short_input() {
        let config = SolverConfig::default();
        assert_eq!(circle_fit(&[], None, &config), Err(FitError::EmptyInput));
        let two = [Vector2::ZERO, Vector2::new(1.0, 0.0)];
        assert!(matches!(
            circle_fit(&two, None, &config),
            Err(FitError::InsufficientData { needed: 3, got: 2 })
        ));
    }
}
