//! Line fit entry point.

use tracing::warn;

use crate::domain::{LineFitResult, LineParams, SolverConfig, Vector2};
use crate::error::FitError;
use crate::fit::least_squares;
use crate::guess::line_guess;
use crate::models::LineModel;

/// Fit a line to `data`, starting from the line through its first and last points.
pub fn line_fit(data: &[Vector2], config: &SolverConfig) -> Result<LineFitResult, FitError> {
    FitError::check_len(data.len(), LineParams::LEN)?;
    let x0 = line_guess(data)?;

    let mut model = LineModel::new(data);
    let solution = least_squares(&mut model, &x0.to_vec(), config).inspect_err(|e| {
        warn!(error = %e, points = data.len(), "line fit failed");
    })?;

    Ok(LineFitResult {
        params: LineParams::from_slice(&solution.params)?,
        residuals: solution.residuals.clone(),
        stats: solution.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::line_segment;
    use crate::math::wrap_angle;

    #[test]
    fn collinear_points_fit_exactly() {
        let data = line_segment(Vector2::new(1.0, 2.0), Vector2::new(7.0, 10.0), 12);
        let fit = line_fit(&data, &SolverConfig::default()).unwrap();
        let expected = (8.0f64).atan2(6.0);
        assert!(wrap_angle(fit.params.angle - expected).abs() < 1e-9);
        for &p in &data {
            assert!(fit.params.line().signed_distance(p).abs() < 1e-9);
        }
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-9));
    }

    #[test]
    fn scattered_points_find_best_offset() {
        // Alternating ±0.5 about y = 3.
        let data: Vec<Vector2> = (0..20)
            .map(|i| Vector2::new(i as f64, 3.0 + if i % 2 == 0 { 0.5 } else { -0.5 }))
            .collect();
        let fit = line_fit(&data, &SolverConfig::default()).unwrap();
        let line = fit.params.line();
        assert!((line.eval_at_x(9.5).map_or(f64::NAN, |p| p.y) - 3.0).abs() < 0.05);
        assert!(fit.residuals.iter().all(|r| (r.abs() - 0.5).abs() < 0.1));
    }

    #[test]
    fn empty_and_single_point() {
        let config = SolverConfig::default();
        assert_eq!(line_fit(&[], &config), Err(FitError::EmptyInput));
        assert!(matches!(
            line_fit(&[Vector2::ZERO], &config),
            Err(FitError::InsufficientData { needed: 2, got: 1 })
        ));
    }
}
