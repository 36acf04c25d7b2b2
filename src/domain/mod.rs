//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - 2D geometry primitives (`Vector2`, `Line2`, `Rect2`)
//! - solver and fit configuration (`SolverConfig`, `FitConfig`, `Loss`, `Method`)
//! - parameter vectors and fit result records

pub mod config;
pub mod geometry;
pub mod types;

pub use config::*;
pub use geometry::*;
pub use types::*;
