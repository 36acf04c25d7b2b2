//! Tunable fit configuration.
//!
//! Every tolerance and budget the fits use lives here with a sensible default. Nothing
//! in this module is an invariant: callers may override any field, and
//! [`FitConfig::from_env`] reads overrides from the process environment (optionally via
//! a `.env` file).

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Optimization method used by the nonlinear least-squares driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Levenberg–Marquardt with Fletcher's damping schedule.
    Lm,
    /// Dogleg steps inside a trust region.
    TrustRegion,
}

/// Robust loss `ρ(z)` applied to squared, scaled residuals `z = (r / f_scale)²`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    Linear,
    SoftL1,
    Huber,
    Cauchy,
    Arctan,
}

impl Loss {
    /// `(ρ(z), ρ'(z))`.
    pub fn eval(self, z: f64) -> (f64, f64) {
        match self {
            Loss::Linear => (z, 1.0),
            Loss::SoftL1 => {
                let t = (1.0 + z).sqrt();
                (2.0 * (t - 1.0), 1.0 / t)
            }
            Loss::Huber => {
                if z <= 1.0 {
                    (z, 1.0)
                } else {
                    let s = z.sqrt();
                    (2.0 * s - 1.0, 1.0 / s)
                }
            }
            Loss::Cauchy => (z.ln_1p(), 1.0 / (1.0 + z)),
            Loss::Arctan => (z.atan(), 1.0 / (1.0 + z * z)),
        }
    }
}

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Gradient infinity norm fell below `gtol`.
    Gradient,
    /// Relative cost reduction fell below `ftol`.
    Cost,
    /// Relative step size fell below `xtol`.
    Step,
    /// Iteration budget exhausted; the best iterate so far is returned.
    MaxIterations,
}

impl StopReason {
    pub fn converged(self) -> bool {
        self != StopReason::MaxIterations
    }
}

/// Options for one nonlinear least-squares run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub method: Method,
    pub loss: Loss,
    /// Residual scale separating inliers from outliers (only used by robust losses).
    pub f_scale: f64,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: Method::Lm,
            loss: Loss::Linear,
            f_scale: 1.0,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            max_iterations: 50,
        }
    }
}

impl SolverConfig {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_loss(mut self, loss: Loss, f_scale: f64) -> Self {
        self.loss = loss;
        self.f_scale = f_scale;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerances(mut self, ftol: f64, xtol: f64, gtol: f64) -> Self {
        self.ftol = ftol;
        self.xtol = xtol;
        self.gtol = gtol;
        self
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.f_scale.is_finite() && self.f_scale > 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "f_scale must be positive, got {}",
                self.f_scale
            )));
        }
        for (name, tol) in [("ftol", self.ftol), ("xtol", self.xtol), ("gtol", self.gtol)] {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(FitError::InvalidConfig(format!(
                    "{name} must be non-negative, got {tol}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(FitError::InvalidConfig("max_iterations must be > 0".into()));
        }
        Ok(())
    }
}

/// Options for the contact-angle fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactAngleConfig {
    pub line: SolverConfig,
    pub circle: SolverConfig,
    /// A line residual at least this large counts against the straight-line model.
    pub line_residual_threshold: f64,
    /// Fall back to a circle when more than this fraction of line residuals is large.
    pub arc_fallback_fraction: f64,
    /// Points within this fraction of the base width from a contact take part in its fit.
    pub contact_neighbourhood: f64,
}

impl Default for ContactAngleConfig {
    fn default() -> Self {
        Self {
            line: SolverConfig::default(),
            circle: SolverConfig::default(),
            line_residual_threshold: 1.0,
            arc_fallback_fraction: 0.0,
            contact_neighbourhood: 0.25,
        }
    }
}

/// Per-fit defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub circle: SolverConfig,
    pub line: SolverConfig,
    pub needle: SolverConfig,
    pub young_laplace: SolverConfig,
    pub contact_angle: ContactAngleConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            circle: SolverConfig::default(),
            line: SolverConfig::default(),
            needle: SolverConfig::default()
                .with_method(Method::TrustRegion)
                .with_loss(Loss::Cauchy, 1.0),
            young_laplace: SolverConfig::default(),
            contact_angle: ContactAngleConfig::default(),
        }
    }
}

pub const ENV_MAX_ITERATIONS: &str = "DROPFIT_MAX_ITERATIONS";
pub const ENV_FTOL: &str = "DROPFIT_FTOL";
pub const ENV_XTOL: &str = "DROPFIT_XTOL";
pub const ENV_GTOL: &str = "DROPFIT_GTOL";

impl FitConfig {
    /// Defaults with solver overrides from the environment.
    ///
    /// Loads `.env` if present, then applies `DROPFIT_MAX_ITERATIONS`, `DROPFIT_FTOL`,
    /// `DROPFIT_XTOL` and `DROPFIT_GTOL` to every solver configuration.
    pub fn from_env() -> Result<Self, FitError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FitConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let max_iterations = parse_var::<usize, _>(&lookup, ENV_MAX_ITERATIONS)?;
        let ftol = parse_var::<f64, _>(&lookup, ENV_FTOL)?;
        let xtol = parse_var::<f64, _>(&lookup, ENV_XTOL)?;
        let gtol = parse_var::<f64, _>(&lookup, ENV_GTOL)?;

        for solver in config.solvers_mut() {
            if let Some(n) = max_iterations {
                solver.max_iterations = n;
            }
            if let Some(v) = ftol {
                solver.ftol = v;
            }
            if let Some(v) = xtol {
                solver.xtol = v;
            }
            if let Some(v) = gtol {
                solver.gtol = v;
            }
            solver.validate()?;
        }
        Ok(config)
    }

    fn solvers_mut(&mut self) -> [&mut SolverConfig; 6] {
        [
            &mut self.circle,
            &mut self.line,
            &mut self.needle,
            &mut self.young_laplace,
            &mut self.contact_angle.line,
            &mut self.contact_angle.circle,
        ]
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, FitError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| FitError::InvalidConfig(format!("{key}={raw}: {e}")))
}
