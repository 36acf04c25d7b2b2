//! Parameter model interface.
//!
//! The least-squares driver relies on two primitive operations:
//! - bind a parameter vector (evaluating residuals and Jacobian for it)
//! - read the current residuals / Jacobian
//!
//! Models own their buffers and only recompute when the parameter vector changes, so the
//! driver may re-set the same parameters (e.g. after a rejected step) for free.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

pub trait ParamModel {
    fn n_params(&self) -> usize;

    fn n_residuals(&self) -> usize;

    /// Degrees of freedom used to normalize the objective: `n - p + 1`.
    fn dof(&self) -> usize {
        (self.n_residuals() + 1).saturating_sub(self.n_params()).max(1)
    }

    /// Bind a parameter vector. A no-op when `params` equals the last bound vector.
    fn set_params(&mut self, params: &[f64]) -> Result<(), FitError>;

    fn params(&self) -> &[f64];

    fn residuals(&self) -> &DVector<f64>;

    /// `n_residuals × n_params` matrix of `∂residual_i/∂param_j`.
    fn jacobian(&self) -> &DMatrix<f64>;

    /// Sum of squared residuals over degrees of freedom.
    fn objective(&self) -> f64 {
        self.residuals().norm_squared() / self.dof() as f64
    }
}

/// Memoized residual/Jacobian storage shared by the concrete models.
#[derive(Debug, Clone)]
pub struct ModelBuffers {
    params: Vec<f64>,
    residuals: DVector<f64>,
    jacobian: DMatrix<f64>,
    evaluations: usize,
}

impl ModelBuffers {
    pub fn new(n_residuals: usize, n_params: usize) -> Self {
        Self {
            params: Vec::new(),
            residuals: DVector::zeros(n_residuals),
            jacobian: DMatrix::zeros(n_residuals, n_params),
            evaluations: 0,
        }
    }

    pub fn n_params(&self) -> usize {
        self.jacobian.ncols()
    }

    pub fn n_residuals(&self) -> usize {
        self.residuals.len()
    }

    /// Recompute via `eval` unless `params` are already bound.
    ///
    /// On error the previously bound state is left untouched.
    pub fn update<F>(&mut self, params: &[f64], eval: F) -> Result<(), FitError>
    where
        F: FnOnce(&[f64], &mut DVector<f64>, &mut DMatrix<f64>) -> Result<(), FitError>,
    {
        if params.len() != self.n_params() {
            return Err(FitError::InvalidConfig(format!(
                "expected {} parameters, got {}",
                self.n_params(),
                params.len()
            )));
        }
        if self.params == params {
            return Ok(());
        }

        let mut residuals = DVector::zeros(self.n_residuals());
        let mut jacobian = DMatrix::zeros(self.n_residuals(), self.n_params());
        eval(params, &mut residuals, &mut jacobian)?;
        if residuals.iter().chain(jacobian.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::numerical("non-finite residual or Jacobian"));
        }

        self.residuals = residuals;
        self.jacobian = jacobian;
        self.params = params.to_vec();
        self.evaluations += 1;
        Ok(())
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn residuals(&self) -> &DVector<f64> {
        &self.residuals
    }

    pub fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    /// How many times residuals were actually recomputed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(p: &[f64], r: &mut DVector<f64>, j: &mut DMatrix<f64>) -> Result<(), FitError> {
        r.fill(p[0]);
        j.fill(1.0);
        Ok(())
    }

    #[test]
    fn identical_params_do_not_recompute() {
        let mut buf = ModelBuffers::new(4, 1);
        buf.update(&[1.0], fill).unwrap();
        buf.update(&[1.0], fill).unwrap();
        assert_eq!(buf.evaluations(), 1);
        buf.update(&[2.0], fill).unwrap();
        assert_eq!(buf.evaluations(), 2);
        assert_eq!(buf.residuals()[3], 2.0);
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let mut buf = ModelBuffers::new(2, 1);
        buf.update(&[1.0], fill).unwrap();
        let err = buf.update(&[f64::NAN], fill).unwrap_err();
        assert!(matches!(err, FitError::NumericalFailure(_)));
        assert_eq!(buf.params(), &[1.0]);
        assert!(buf.update(&[1.0, 2.0], fill).is_err());
    }
}
