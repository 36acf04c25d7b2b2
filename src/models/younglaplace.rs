//! Young–Laplace model: signed normal distance from a scaled, rotated drop profile.
//!
//! Each data point is mapped into the drop's local frame
//!
//! ```text
//! r = u_r·(p − O)    z = u_z·(p − O)
//! u_r = (cos ω, sin ω)    u_z = (−sin ω, cos ω)
//! ```
//!
//! and matched to the closest profile point of the dimensionless curve at `(r, z)/R`.
//! The residual is the Euclidean distance to that point, signed by the outward profile
//! normal so points outside the drop are positive. Where the closest-point search
//! converged the error vector is normal to the profile, and where it was clamped the
//! arclength is fixed, so in both cases the Jacobian is the error direction applied to
//! the partials at fixed arclength.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Vector2, YoungLaplaceParams};
use crate::error::FitError;
use crate::models::{ModelBuffers, ParamModel};
use crate::shape::ShapeCache;

/// Parameters `[bond, radius, apex_x, apex_y, rotation]`.
#[derive(Debug, Clone)]
pub struct YoungLaplaceModel<'a> {
    data: &'a [Vector2],
    cache: ShapeCache,
    arclengths: Vec<f64>,
    buf: ModelBuffers,
}

impl<'a> YoungLaplaceModel<'a> {
    pub fn new(data: &'a [Vector2]) -> Self {
        Self {
            data,
            cache: ShapeCache::new(),
            arclengths: vec![0.0; data.len()],
            buf: ModelBuffers::new(data.len(), YoungLaplaceParams::LEN),
        }
    }

    /// Signed dimensionless arclength of each point's closest profile point.
    pub fn arclengths(&self) -> &[f64] {
        &self.arclengths
    }

    /// `(volume, surface_area)` of the bound drop up to the furthest data point.
    pub fn volume_and_area(&mut self) -> Result<(f64, f64), FitError> {
        let params = YoungLaplaceParams::from_slice(self.buf.params())?;
        let s_max = self.arclengths.iter().fold(0.0f64, |m, s| m.max(s.abs()));
        let shape = self.cache.get(params.bond);
        let r = params.radius;
        Ok((shape.volume(s_max) * r.powi(3), shape.surface_area(s_max) * r.powi(2)))
    }
}

impl ParamModel for YoungLaplaceModel<'_> {
    fn n_params(&self) -> usize {
        YoungLaplaceParams::LEN
    }

    fn n_residuals(&self) -> usize {
        self.data.len()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<(), FitError> {
        let data = self.data;
        let cache = &mut self.cache;
        let mut trial = vec![0.0; data.len()];
        let mut evaluated = false;

        self.buf.update(params, |p, res, jac| {
            let [bond, radius, apex_x, apex_y, rotation] = [p[0], p[1], p[2], p[3], p[4]];
            if !(radius.is_finite() && radius > 0.0 && bond.is_finite()) {
                return Err(FitError::numerical(format!(
                    "invalid profile scale: bond {bond}, radius {radius}"
                )));
            }

            let (sin_w, cos_w) = rotation.sin_cos();
            let apex = Vector2::new(apex_x, apex_y);
            let shape = cache.get(bond);

            for (i, &point) in data.iter().enumerate() {
                let d = point - apex;
                let rd = cos_w * d.x + sin_w * d.y;
                let zd = -sin_w * d.x + cos_w * d.y;

                let s = shape.closest(rd / radius, zd / radius);
                let y = shape.eval(s);
                trial[i] = s;

                // Outward normal (z', −r').
                let (n_r, n_z) = (y[3], -y[2]);
                let (e_r, e_z) = (rd - radius * y[0], zd - radius * y[1]);
                let dist = e_r.hypot(e_z);
                let (n_r, n_z) = if dist > 0.0 {
                    let sign = if n_r * e_r + n_z * e_z < 0.0 { -1.0 } else { 1.0 };
                    (sign * e_r / dist, sign * e_z / dist)
                } else {
                    (n_r, n_z)
                };
                res[i] = n_r * e_r + n_z * e_z;

                jac[(i, 0)] = -radius * (n_r * y[4] + n_z * y[5]);
                jac[(i, 1)] = -(n_r * y[0] + n_z * y[1]);
                jac[(i, 2)] = -(n_r * cos_w - n_z * sin_w);
                jac[(i, 3)] = -(n_r * sin_w + n_z * cos_w);
                jac[(i, 4)] = n_r * zd - n_z * rd;
            }
            evaluated = true;
            Ok(())
        })?;

        if evaluated {
            self.arclengths = trial;
        }
        Ok(())
    }

    fn params(&self) -> &[f64] {
        self.buf.params()
    }

    fn residuals(&self) -> &DVector<f64> {
        self.buf.residuals()
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        self.buf.jacobian()
    }
}
