//! Young–Laplace drop profile.
//!
//! - `system`: the profile ODE with Bond-number sensitivities
//! - `inversion`: height → arclength table for seeding closest-point searches
//! - `curve`: lazily extended, cached profile for one Bond number
//! - `cache`: owner that swaps profiles when the Bond number changes

pub mod cache;
pub mod curve;
pub mod inversion;
pub mod system;

pub use cache::*;
pub use curve::*;
pub use inversion::*;
pub use system::*;
