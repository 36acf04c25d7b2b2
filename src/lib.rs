//! `dropfit`: drop-shape and contact-angle fitting on 2-D contour points.
//!
//! The crate takes plain point arrays (typically edge pixels from an image of a drop)
//! and returns typed fit results:
//!
//! - circle and line fits
//! - needle fits (two parallel edges, used to calibrate image scale)
//! - Young–Laplace fits of pendant drops (Bond number, apex radius, apex, rotation,
//!   volume, surface area)
//! - contact-angle fits of sessile drops against a baseline
//!
//! Layout:
//!
//! - `domain`: geometry primitives, parameter and result records, configuration
//! - `shape`: the dimensionless Young–Laplace profile
//! - `models`: residual/Jacobian models for the least-squares driver
//! - `guess`: initial parameter estimates
//! - `fit`: the least-squares driver and the fit entry points
//! - `math`, `data`: numerical kernels and synthetic contours
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod guess;
pub mod math;
pub mod models;
pub mod shape;

pub use domain::{FitConfig, Line2, SolverConfig, Vector2};
pub use error::FitError;
pub use fit::{circle_fit, contact_angle_fit, line_fit, needle_fit, young_laplace_fit};
