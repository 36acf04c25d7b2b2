//! Lazily integrated Young–Laplace profile for one Bond number.
//!
//! The curve is integrated once from the apex and every accepted step is kept as a
//! dense segment, so any arclength inside the solved domain is answered by a binary
//! search plus a polynomial evaluation. Queries past the solved domain extend it on
//! demand, up to [`MAX_ARCLENGTH`].
//!
//! Negative arclengths address the mirrored (left) half of the profile.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::math::{DenseSegment, Dopri5, OdeSystem, minimize_bounded};
use crate::shape::{
    APEX_STATE, HeightInversion, INTEGRAL_APEX_STATE, IntegralSystem, ProfileState, ProfileSystem,
};

/// Arclength solved eagerly on construction.
pub const INIT_ARCLENGTH: f64 = 4.0;
/// Integration never goes past this arclength.
pub const MAX_ARCLENGTH: f64 = 10.0;
pub const MAX_CLOSEST_ITERATIONS: usize = 10;
pub const CLOSEST_TOL: f64 = 1e-6;

const TURNING_POINT_XATOL: f64 = 1e-12;

/// Components that change sign on the mirrored branch: `r`, `z'`, `∂r/∂Bo`, `∂z'/∂Bo`.
const MIRRORED: [usize; 4] = [0, 3, 4, 7];

#[derive(Debug, Clone)]
pub struct YoungLaplaceShape {
    bond: f64,
    stepper: Dopri5<ProfileSystem, 8>,
    segments: Vec<DenseSegment<8>>,
    inversion: HeightInversion,
    exhausted: bool,
    integrals: HashMap<u64, [f64; 2]>,
}

impl YoungLaplaceShape {
    pub fn new(bond: f64) -> Self {
        let stepper = Dopri5::new(ProfileSystem { bond }, 0.0, APEX_STATE, MAX_ARCLENGTH);
        let mut shape = Self {
            bond,
            stepper,
            segments: Vec::new(),
            inversion: HeightInversion::new(),
            exhausted: false,
            integrals: HashMap::new(),
        };
        shape.extend_to(INIT_ARCLENGTH);
        shape
    }

    pub fn bond(&self) -> f64 {
        self.bond
    }

    /// End of the solved domain.
    pub fn solved_max(&self) -> f64 {
        self.segments.last().map_or(0.0, DenseSegment::t1)
    }

    /// Whether integration has stopped for good (domain limit or failure).
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Full state at signed arclength `s`.
    ///
    /// Beyond the reachable domain the last solved state is returned.
    pub fn eval(&mut self, s: f64) -> ProfileState {
        let a = s.abs();
        self.extend_to(a);

        let mut y = self.eval_solved(a.min(self.solved_max()));
        if s < 0.0 {
            for i in MIRRORED {
                y[i] = -y[i];
            }
        }
        y
    }

    /// `(r, z)` at signed arclength `s`.
    pub fn point(&mut self, s: f64) -> (f64, f64) {
        let y = self.eval(s);
        (y[0], y[1])
    }

    /// `(∂r/∂Bo, ∂z/∂Bo)` at signed arclength `s`.
    pub fn dbond(&mut self, s: f64) -> (f64, f64) {
        let y = self.eval(s);
        (y[4], y[5])
    }

    /// Arclength at height `z` on the rising part of the right branch.
    ///
    /// Extends the curve as needed; `None` if `z` lies above the turning point or
    /// outside the reachable domain.
    pub fn z_inv(&mut self, z: f64) -> Option<f64> {
        loop {
            if let Some(s) = self.inversion.lookup(z) {
                return Some(s);
            }
            if z < 0.0 || self.inversion.is_solved() || !self.step_once() {
                return None;
            }
        }
    }

    /// `(z, s)` of the first height maximum, if the reachable profile has one.
    pub fn turning_point(&mut self) -> Option<(f64, f64)> {
        while !self.inversion.is_solved() {
            if !self.step_once() {
                return None;
            }
        }
        Some((self.inversion.max_z(), self.inversion.last_s()))
    }

    /// Signed arclength of the profile point closest to `(r, z)`.
    ///
    /// Seeds from the height inversion and refines with a Newton iteration on the
    /// squared distance.
    pub fn closest(&mut self, r: f64, z: f64) -> f64 {
        let mut s = if z > 0.0 {
            self.z_inv(z).unwrap_or_else(|| self.inversion.last_s())
        } else {
            0.0
        };
        if r < 0.0 {
            s = -s;
        }

        for _ in 0..MAX_CLOSEST_ITERATIONS {
            let y = self.eval(s);
            let dd = self.system().rhs(s, &y);
            let (er, ez) = (r - y[0], z - y[1]);

            let f = -2.0 * (er * y[2] + ez * y[3]);
            let fp = -2.0 * (-1.0 + er * dd[2] + ez * dd[3]);
            if fp == 0.0 || !fp.is_finite() || !f.is_finite() {
                break;
            }

            let next = (s - f / fp.abs()).clamp(-MAX_ARCLENGTH, MAX_ARCLENGTH);
            let delta = (next - s).abs();
            s = next;
            if delta < CLOSEST_TOL {
                break;
            }
        }
        s
    }

    /// [`closest`](Self::closest) for each `(r, z)` pair, in order.
    pub fn closest_all(&mut self, points: &[(f64, f64)]) -> Vec<f64> {
        points.iter().map(|&(r, z)| self.closest(r, z)).collect()
    }

    /// Dimensionless volume enclosed between the apex and arclength `|s|`.
    pub fn volume(&mut self, s: f64) -> f64 {
        self.integrals(s)[0]
    }

    /// Dimensionless lateral surface area between the apex and arclength `|s|`.
    pub fn surface_area(&mut self, s: f64) -> f64 {
        self.integrals(s)[1]
    }

    fn system(&self) -> &ProfileSystem {
        self.stepper.system()
    }

    fn integrals(&mut self, s: f64) -> [f64; 2] {
        let a = s.abs().min(MAX_ARCLENGTH);
        let key = a.to_bits();
        if let Some(v) = self.integrals.get(&key) {
            return *v;
        }

        let mut stepper = Dopri5::new(IntegralSystem { bond: self.bond }, 0.0, INTEGRAL_APEX_STATE, a);
        loop {
            match stepper.step() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    warn!(bond = self.bond, s = a, error = %e, "volume integration stopped early");
                    break;
                }
            }
        }
        let y = stepper.y();
        let value = [y[4], y[5]];
        self.integrals.insert(key, value);
        value
    }

    fn eval_solved(&self, a: f64) -> ProfileState {
        if self.segments.is_empty() {
            return APEX_STATE;
        }
        let ix = self
            .segments
            .partition_point(|seg| seg.t1() < a)
            .min(self.segments.len() - 1);
        self.segments[ix].eval(a)
    }

    fn extend_to(&mut self, a: f64) {
        while self.solved_max() < a && self.step_once() {}
    }

    /// Integrate one more step. Returns `false` once no more steps are possible.
    fn step_once(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.stepper.step() {
            Ok(Some(segment)) => {
                self.update_inversion(&segment);
                self.segments.push(segment);
                true
            }
            Ok(None) => {
                trace!(bond = self.bond, s = self.solved_max(), "profile reached maximum arclength");
                self.exhausted = true;
                false
            }
            Err(e) => {
                warn!(bond = self.bond, s = self.solved_max(), error = %e, "profile integration failed");
                self.exhausted = true;
                false
            }
        }
    }

    fn update_inversion(&mut self, segment: &DenseSegment<8>) {
        if self.inversion.is_solved() {
            return;
        }
        let end = segment.eval(segment.t1());
        if end[1] > self.inversion.max_z() && end[3] > 0.0 {
            self.inversion.push(end[1], segment.t1());
            return;
        }

        let s_max = minimize_bounded(
            |s| -segment.eval(s)[1],
            segment.t0(),
            segment.t1(),
            TURNING_POINT_XATOL,
        );
        self.inversion.push(segment.eval(s_max)[1], s_max);
        self.inversion.mark_solved();
        trace!(
            bond = self.bond,
            z = self.inversion.max_z(),
            s = self.inversion.last_s(),
            "located profile turning point"
        );
    }
}
