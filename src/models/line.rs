//! Line model in normal form.

use nalgebra::{DMatrix, DVector};

use crate::domain::{LineParams, Vector2};
use crate::error::FitError;
use crate::models::{ModelBuffers, ParamModel};

/// Parameters `[angle, rho]`; residual `n·p − rho` with `n = (−sin angle, cos angle)`.
#[derive(Debug, Clone)]
pub struct LineModel<'a> {
    data: &'a [Vector2],
    buf: ModelBuffers,
}

impl<'a> LineModel<'a> {
    pub fn new(data: &'a [Vector2]) -> Self {
        Self {
            data,
            buf: ModelBuffers::new(data.len(), LineParams::LEN),
        }
    }
}

impl ParamModel for LineModel<'_> {
    fn n_params(&self) -> usize {
        LineParams::LEN
    }

    fn n_residuals(&self) -> usize {
        self.data.len()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<(), FitError> {
        let data = self.data;
        self.buf.update(params, |p, res, jac| {
            let u = Vector2::from_angle(p[0]);
            let n = u.perp();
            for (i, &point) in data.iter().enumerate() {
                res[i] = n.dot(point) - p[1];
                jac[(i, 0)] = -u.dot(point);
                jac[(i, 1)] = -1.0;
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
