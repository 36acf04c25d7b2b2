//! Right-hand sides of the Young–Laplace profile equations.
//!
//! Dimensionless profile, arclength `s` from the apex, tangent angle `φ`:
//!
//! ```text
//! dφ/ds = 2 − Bo·z − sin φ / r
//! dr/ds = cos φ          dz/ds = sin φ
//! ```
//!
//! We integrate the second-order form in `(r, z)` together with its derivative with
//! respect to the Bond number, which gives the Bond column of the Jacobian without
//! finite differencing.

use std::f64::consts::PI;

use crate::math::OdeSystem;

/// Regularizes `sin φ / r` at the apex, where both vanish.
pub const APEX_EPS: f64 = f64::from_bits(1);

/// State `[r, z, r', z', ∂r/∂Bo, ∂z/∂Bo, ∂r'/∂Bo, ∂z'/∂Bo]`.
pub type ProfileState = [f64; 8];

/// Initial state at the apex.
pub const APEX_STATE: ProfileState = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];

#[inline]
fn dphi_ds(bond: f64, r: f64, z: f64, dz: f64) -> f64 {
    2.0 - bond * z - (dz + APEX_EPS) / (r + APEX_EPS)
}

/// Profile plus Bond-number sensitivities.
#[derive(Debug, Clone, Copy)]
pub struct ProfileSystem {
    pub bond: f64,
}

impl OdeSystem<8> for ProfileSystem {
    fn rhs(&self, _s: f64, y: &ProfileState) -> ProfileState {
        let [r, z, dr, dz, r_b, z_b, dr_b, dz_b] = *y;
        let bo = self.bond;

        let dphi = dphi_ds(bo, r, z, dz);
        let dphi_b = -z - bo * z_b - dz_b / (r + APEX_EPS) + r_b * dz / (r * r + APEX_EPS);

        [
            dr,
            dz,
            -dz * dphi,
            dr * dphi,
            dr_b,
            dz_b,
            -dz_b * dphi - dphi_b * dz,
            dr_b * dphi + dphi_b * dr,
        ]
    }
}

/// Profile plus enclosed volume and lateral surface area.
///
/// State `[r, z, r', z', V, A]`.
#[derive(Debug, Clone, Copy)]
pub struct IntegralSystem {
    pub bond: f64,
}

pub const INTEGRAL_APEX_STATE: [f64; 6] = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

impl OdeSystem<6> for IntegralSystem {
    fn rhs(&self, _s: f64, y: &[f64; 6]) -> [f64; 6] {
        let [r, z, dr, dz, _, _] = *y;
        let dphi = dphi_ds(self.bond, r, z, dz);
        [dr, dz, -dz * dphi, dr * dphi, PI * r * r * dz, 2.0 * PI * r]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apex_curvature_is_unity() {
        let d = ProfileSystem { bond: 0.3 }.rhs(0.0, &APEX_STATE);
        assert_eq!(d[0], 1.0);
        assert_eq!(d[1], 0.0);
        assert_eq!(d[2], 0.0);
        assert_eq!(d[3], 1.0);
        assert!(d[4..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn mirrored_state_gives_mirrored_second_derivatives() {
        let sys = ProfileSystem { bond: 0.2 };
        let y = [0.8, 0.4, 0.6, 0.8, 0.01, 0.02, 0.03, 0.04];
        let m = [-0.8, 0.4, 0.6, -0.8, -0.01, 0.02, 0.03, -0.04];
        let d = sys.rhs(0.0, &y);
        let dm = sys.rhs(0.0, &m);
        assert!((d[2] + dm[2]).abs() < 1e-15);
        assert!((d[3] - dm[3]).abs() < 1e-15);
    }
}
