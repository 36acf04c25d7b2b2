//! Data sources.
//!
//! The crate consumes plain point arrays; this module only provides synthetic
//! generators for calibration and testing.

pub mod synthetic;

pub use synthetic::*;
