//! Needle model: two parallel edges symmetric about an axis.

use nalgebra::{DMatrix, DVector};

use crate::domain::{NeedleParams, Vector2};
use crate::error::FitError;
use crate::models::{ModelBuffers, ParamModel};

/// Parameters `[rotation, rho, radius]`.
///
/// With `n = (cos rotation, sin rotation)` each point has a signed offset
/// `q = n·p − rho` from the axis and residual `|q| − radius`.
#[derive(Debug, Clone)]
pub struct NeedleModel<'a> {
    data: &'a [Vector2],
    buf: ModelBuffers,
}

impl<'a> NeedleModel<'a> {
    pub fn new(data: &'a [Vector2]) -> Self {
        Self {
            data,
            buf: ModelBuffers::new(data.len(), NeedleParams::LEN),
        }
    }

    /// Points on the negative side of the axis under the bound parameters.
    pub fn left_mask(&self) -> Vec<bool> {
        let p = self.buf.params();
        if p.len() != NeedleParams::LEN {
            return vec![false; self.data.len()];
        }
        let n = Vector2::from_angle(p[0]);
        self.data.iter().map(|&point| n.dot(point) - p[1] < 0.0).collect()
    }
}

impl ParamModel for NeedleModel<'_> {
    fn n_params(&self) -> usize {
        NeedleParams::LEN
    }

    fn n_residuals(&self) -> usize {
        self.data.len()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<(), FitError> {
        let data = self.data;
        self.buf.update(params, |p, res, jac| {
            let n = Vector2::from_angle(p[0]);
            let u = n.perp();
            for (i, &point) in data.iter().enumerate() {
                let q = n.dot(point) - p[1];
                let sign = q.signum();
                res[i] = q.abs() - p[2];
                jac[(i, 0)] = sign * u.dot(point);
                jac[(i, 1)] = -sign;
                jac[(i, 2)] = -1.0;
            }
            Ok(())
        })
    }

    fn params(&self) -> &[f64] {
        self.buf.params()
    }

    fn residuals(&self) -> &DVector<f64> {
        self.buf.residuals()
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        self.buf.jacobian()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_needle_residuals_and_sides() {
        // Axis x = 5, edges at x = 3 and x = 7.
        let data = [Vector2::new(3.0, 1.0), Vector2::new(7.0, 2.0), Vector2::new(8.0, 0.0)];
        let mut model = NeedleModel::new(&data);
        model.set_params(&[0.0, 5.0, 2.0]).unwrap();
        assert_eq!(model.residuals().as_slice(), &[0.0, 0.0, 1.0]);
        assert_eq!(model.left_mask(), vec![true, false, false]);
        assert_eq!(model.jacobian()[(0, 1)], 1.0);
        assert_eq!(model.jacobian()[(1, 1)], -1.0);
    }

    #[test]
    fn rotation_column_matches_finite_difference() {
        let data = [Vector2::new(1.0, 2.0), Vector2::new(-3.0, 0.5)];
        let (rot, rho, h) = (0.3, 0.2, 1e-6);
        let mut model = NeedleModel::new(&data);
        model.set_params(&[rot + h, rho, 1.0]).unwrap();
        let hi = model.residuals().clone();
        model.set_params(&[rot - h, rho, 1.0]).unwrap();
        let lo = model.residuals().clone();
        model.set_params(&[rot, rho, 1.0]).unwrap();
        for i in 0..data.len() {
            let fd = (hi[i] - lo[i]) / (2.0 * h);
            assert!((model.jacobian()[(i, 0)] - fd).abs() < 1e-7);
        }
    }
}
