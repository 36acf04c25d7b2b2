//! Circle model: signed radial distance from a circle.

use nalgebra::{DMatrix, DVector};

use crate::domain::{CircleParams, Vector2};
use crate::error::FitError;
use crate::models::{ModelBuffers, ParamModel};

/// Parameters `[center_x, center_y, radius]`; residual `|p − c| − R`.
#[derive(Debug, Clone)]
pub struct CircleModel<'a> {
    data: &'a [Vector2],
    buf: ModelBuffers,
}

impl<'a> CircleModel<'a> {
    pub fn new(data: &'a [Vector2]) -> Self {
        Self {
            data,
            buf: ModelBuffers::new(data.len(), CircleParams::LEN),
        }
    }
}

impl ParamModel for CircleModel<'_> {
    fn n_params(&self) -> usize {
        CircleParams::LEN
    }

    fn n_residuals(&self) -> usize {
        self.data.len()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<(), FitError> {
        let data = self.data;
        self.buf.update(params, |p, res, jac| {
            let center = Vector2::new(p[0], p[1]);
            let radius = p[2];
            for (i, &point) in data.iter().enumerate() {
                let d = point - center;
                let dist = d.norm();
                res[i] = dist - radius;
                if dist > 0.0 {
                    jac[(i, 0)] = -d.x / dist;
                    jac[(i, 1)] = -d.y / dist;
                }
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
