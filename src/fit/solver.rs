//! Nonlinear least-squares driver.
//!
//! Minimizes `½ Σ f² ρ((rᵢ/f)²)` over a [`ParamModel`]'s parameters, where `ρ` is the
//! configured [`Loss`] and `f` its scale. Robust losses enter through iteratively
//! reweighted normal equations:
//!
//! ```text
//! A = Jᵀ W J    g = Jᵀ W r    W = diag(ρ'(zᵢ))
//! ```
//!
//! Two step strategies share that linearization:
//! - `Method::Lm`: Levenberg–Marquardt with Fletcher's damping schedule. The damping is
//!   zero (pure Gauss–Newton) until a poor step is seen, then starts from the cutoff
//!   `1/‖A⁻¹‖∞` and grows or shrinks with the gain ratio.
//! - `Method::TrustRegion`: dogleg steps in Jacobian-scaled variables.
//!
//! Both stop on the first of `gtol` (gradient), `ftol` (relative cost decrease), `xtol`
//! (relative step) or the iteration budget. Running out of iterations is reported via
//! [`StopReason::MaxIterations`], not as an error.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{FitStats, Loss, Method, SolverConfig, StopReason};
use crate::error::FitError;
use crate::math::{inverse_norm_inf, solve_least_squares, solve_symmetric};
use crate::models::ParamModel;

/// Final iterate of a least-squares run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub params: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Robust cost `½ Σ f² ρ(z)` at `params`.
    pub cost: f64,
    /// Plain sum of squared residuals over degrees of freedom.
    pub objective: f64,
    pub iterations: usize,
    pub stop_reason: StopReason,
}

impl Solution {
    pub fn stats(&self) -> FitStats {
        FitStats {
            objective: self.objective,
            iterations: self.iterations,
            stop_reason: self.stop_reason,
        }
    }
}

/// Weighted linearization at the currently bound parameters.
struct Linearization {
    cost: f64,
    /// `√W J`
    jw: DMatrix<f64>,
    /// `√W r`
    rw: DVector<f64>,
    a: DMatrix<f64>,
    g: DVector<f64>,
}

fn robust_cost(residuals: &DVector<f64>, loss: Loss, f_scale: f64) -> f64 {
    let c2 = f_scale * f_scale;
    0.5 * c2
        * residuals
            .iter()
            .map(|r| loss.eval(r * r / c2).0)
            .sum::<f64>()
}

fn linearize<M: ParamModel>(model: &M, config: &SolverConfig) -> Linearization {
    let r = model.residuals();
    let j = model.jacobian();
    let c2 = config.f_scale * config.f_scale;

    let mut jw = j.clone();
    let mut rw = r.clone();
    let mut cost = 0.0;
    for i in 0..r.len() {
        let (rho, rho1) = config.loss.eval(r[i] * r[i] / c2);
        cost += rho;
        let sw = rho1.max(0.0).sqrt();
        rw[i] *= sw;
        jw.row_mut(i).scale_mut(sw);
    }

    let a = jw.transpose() * &jw;
    let g = jw.transpose() * &rw;
    Linearization {
        cost: 0.5 * c2 * cost,
        jw,
        rw,
        a,
        g,
    }
}

/// Cost at `x`, or `None` if the model cannot be evaluated there.
fn trial_cost<M: ParamModel>(model: &mut M, x: &DVector<f64>, config: &SolverConfig) -> Option<f64> {
    model.set_params(x.as_slice()).ok()?;
    let cost = robust_cost(model.residuals(), config.loss, config.f_scale);
    cost.is_finite().then_some(cost)
}

/// Predicted cost decrease of step `delta` under the quadratic model.
fn predicted_reduction(lin: &Linearization, delta: &DVector<f64>) -> f64 {
    -(delta.dot(&lin.g) + 0.5 * delta.dot(&(&lin.a * delta)))
}

/// Run the configured method from `x0`.
pub fn least_squares<M: ParamModel>(
    model: &mut M,
    x0: &[f64],
    config: &SolverConfig,
) -> Result<Solution, FitError> {
    config.validate()?;
    if x0.len() != model.n_params() {
        return Err(FitError::InvalidConfig(format!(
            "expected {} initial parameters, got {}",
            model.n_params(),
            x0.len()
        )));
    }
    model.set_params(x0)?;

    let (x, iterations, stop_reason) = match config.method {
        Method::Lm => levenberg_marquardt(model, x0, config)?,
        Method::TrustRegion => dogleg(model, x0, config)?,
    };

    model.set_params(x.as_slice())?;
    let residuals: Vec<f64> = model.residuals().iter().copied().collect();
    let cost = robust_cost(model.residuals(), config.loss, config.f_scale);
    let objective = model.objective();

    debug!(
        method = ?config.method,
        iterations,
        stop_reason = ?stop_reason,
        objective,
        "least squares finished"
    );

    Ok(Solution {
        params: x.iter().copied().collect(),
        residuals,
        cost,
        objective,
        iterations,
        stop_reason,
    })
}

fn levenberg_marquardt<M: ParamModel>(
    model: &mut M,
    x0: &[f64],
    config: &SolverConfig,
) -> Result<(DVector<f64>, usize, StopReason), FitError> {
    let mut x = DVector::from_column_slice(x0);
    let mut lin = linearize(model, config);
    let mut lambda = 0.0;
    let mut lambda_c = 0.0;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        if lin.g.amax() <= config.gtol {
            return Ok((x, iterations, StopReason::Gradient));
        }
        iterations += 1;

        let mut lhs = lin.a.clone();
        for i in 0..lhs.nrows() {
            lhs[(i, i)] += lambda * lin.a[(i, i)];
        }
        let delta = solve_symmetric(&lhs, &-&lin.g)
            .ok_or_else(|| FitError::numerical("singular normal equations"))?;

        let x_new = &x + &delta;
        let cost_new = trial_cost(model, &x_new, config).unwrap_or(f64::INFINITY);
        let pred = predicted_reduction(&lin, &delta);
        let ratio = if pred > 0.0 {
            (lin.cost - cost_new) / pred
        } else {
            -1.0
        };

        if ratio < 0.25 {
            let dg = delta.dot(&lin.g);
            let mut nu = if cost_new.is_finite() && dg < 0.0 {
                (2.0 - (cost_new - lin.cost) / dg).clamp(2.0, 10.0)
            } else {
                10.0
            };
            if lambda == 0.0 {
                lambda_c = match inverse_norm_inf(&lin.a) {
                    Some(norm) if norm > 0.0 => 1.0 / norm,
                    _ => 1e-3 * lin.a.diagonal().amax().max(f64::MIN_POSITIVE),
                };
                lambda = lambda_c;
                nu /= 2.0;
            }
            lambda *= nu;
        } else if ratio > 0.75 {
            lambda /= 2.0;
            if lambda < lambda_c {
                lambda = 0.0;
            }
        }

        debug!(iteration = iterations, cost = lin.cost, cost_new, lambda, ratio, "lm step");

        if cost_new < lin.cost {
            let reduction = lin.cost - cost_new;
            x = x_new;
            lin = linearize(model, config);

            if reduction <= config.ftol * lin.cost.max(cost_new) {
                return Ok((x, iterations, StopReason::Cost));
            }
            if delta.norm() <= config.xtol * (config.xtol + x.norm()) {
                return Ok((x, iterations, StopReason::Step));
            }
        } else {
            model.set_params(x.as_slice())?;
        }
    }

    if lin.g.amax() <= config.gtol {
        return Ok((x, iterations, StopReason::Gradient));
    }
    Ok((x, iterations, StopReason::MaxIterations))
}

fn dogleg<M: ParamModel>(
    model: &mut M,
    x0: &[f64],
    config: &SolverConfig,
) -> Result<(DVector<f64>, usize, StopReason), FitError> {
    let mut x = DVector::from_column_slice(x0);
    let mut lin = linearize(model, config);
    let mut scale = lin.a.diagonal().map(|d| if d > 0.0 { d.sqrt() } else { 1.0 });
    let mut radius = {
        let r = x.component_mul(&scale).norm();
        if r > 0.0 { r } else { 1.0 }
    };
    let mut iterations = 0;

    while iterations < config.max_iterations {
        if lin.g.amax() <= config.gtol {
            return Ok((x, iterations, StopReason::Gradient));
        }
        iterations += 1;

        // Scaled variables x̂ = D x.
        let g_s = lin.g.component_div(&scale);
        let mut j_s = lin.jw.clone();
        for (j, mut col) in j_s.column_iter_mut().enumerate() {
            col /= scale[j];
        }

        let p_gn = solve_least_squares(&j_s, &-&lin.rw)
            .ok_or_else(|| FitError::numerical("singular Jacobian"))?;
        let jg = &j_s * &g_s;
        let g_norm2 = g_s.norm_squared();
        let curvature = jg.norm_squared();
        let p_cauchy = if curvature > 0.0 {
            &g_s * (-g_norm2 / curvature)
        } else {
            &g_s * (-radius / g_s.norm())
        };

        let p = if p_gn.norm() <= radius {
            p_gn
        } else if p_cauchy.norm() >= radius {
            &g_s * (-radius / g_s.norm())
        } else {
            let d = &p_gn - &p_cauchy;
            let a = d.norm_squared();
            let b = 2.0 * p_cauchy.dot(&d);
            let c = p_cauchy.norm_squared() - radius * radius;
            let tau = (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
            &p_cauchy + d * tau
        };
        let p_norm = p.norm();
        let delta = p.component_div(&scale);

        let x_new = &x + &delta;
        let cost_new = trial_cost(model, &x_new, config).unwrap_or(f64::INFINITY);
        let pred = predicted_reduction(&lin, &delta);
        let ratio = if pred > 0.0 {
            (lin.cost - cost_new) / pred
        } else {
            -1.0
        };

        if ratio < 0.25 {
            radius = 0.25 * p_norm;
        } else if ratio > 0.75 && p_norm >= 0.95 * radius {
            radius *= 2.0;
        }

        debug!(iteration = iterations, cost = lin.cost, cost_new, radius, ratio, "dogleg step");

        if ratio > 1e-4 && cost_new < lin.cost {
            let reduction = lin.cost - cost_new;
            x = x_new;
            lin = linearize(model, config);
            scale = scale.zip_map(&lin.a.diagonal(), |s, d| s.max(d.max(0.0).sqrt()));

            if reduction <= config.ftol * lin.cost.max(cost_new) {
                return Ok((x, iterations, StopReason::Cost));
            }
            if delta.norm() <= config.xtol * (config.xtol + x.norm()) {
                return Ok((x, iterations, StopReason::Step));
            }
        } else {
            model.set_params(x.as_slice())?;
            if radius <= config.xtol * (config.xtol + x.component_mul(&scale).norm()) {
                return Ok((x, iterations, StopReason::Step));
            }
        }
    }

    if lin.g.amax() <= config.gtol {
        return Ok((x, iterations, StopReason::Gradient));
    }
    Ok((x, iterations, StopReason::MaxIterations))
}
