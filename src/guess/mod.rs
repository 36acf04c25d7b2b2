//! Initial parameter estimates for the fits.
//!
//! Every estimator is deterministic: the same contour always yields the same guess.

pub mod bond;
pub mod circle;
pub mod line;
pub mod needle;
pub mod pendant;
pub mod younglaplace;

pub use bond::*;
pub use circle::*;
pub use line::*;
pub use needle::*;
pub use pendant::*;
pub use younglaplace::*;
