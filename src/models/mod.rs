//! Parameter models.
//!
//! Each model binds a data slice and maps a parameter vector to residuals plus an
//! analytic Jacobian:
//!
//! - `CircleModel`: radial distance from a circle
//! - `LineModel`: normal-form distance from a line
//! - `NeedleModel`: distance from two parallel edges
//! - `YoungLaplaceModel`: normal distance from a drop profile

pub mod circle;
pub mod line;
pub mod model;
pub mod needle;
pub mod younglaplace;

pub use circle::*;
pub use line::*;
pub use model::*;
pub use needle::*;
pub use younglaplace::*;
