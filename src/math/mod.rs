//! Numerical kernels shared by the shape model, the fits and the guess estimators.
//!
//! - `ode`: Dormand–Prince 5(4) stepper with dense output
//! - `minimize`: bounded scalar minimization
//! - `ols`: small dense linear solves
//! - `stats`: quantiles, histograms, peak prominence

pub mod minimize;
pub mod ode;
pub mod ols;
pub mod stats;

pub use minimize::*;
pub use ode::*;
pub use ols::*;
pub use stats::*;
