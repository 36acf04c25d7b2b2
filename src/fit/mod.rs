//! Fit entry points.
//!
//! Each fit binds a [`ParamModel`](crate::models::ParamModel) to the data, starts from the
//! matching estimator in [`guess`](crate::guess) and runs the least-squares driver:
//!
//! - `circle` / `line`: plain geometric fits
//! - `needle`: two parallel edges, robust by default
//! - `younglaplace`: pendant drop profile
//! - `conan`: contact angles of a sessile drop

pub mod circle;
pub mod conan;
pub mod line;
pub mod needle;
pub mod solver;
pub mod younglaplace;

pub use circle::*;
pub use conan::*;
pub use line::*;
pub use needle::*;
pub use solver::*;
pub use younglaplace::*;
