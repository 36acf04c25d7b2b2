//! 2D geometry primitives.
//!
//! - `Vector2`: a plain `(x, y)` pair with the usual arithmetic
//! - `Line2`: an infinite line through two distinct points
//! - `Rect2`: an axis-aligned rectangle (regions of interest, bounding boxes)

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::FitError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians from the +x axis.
    pub fn from_angle(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s)
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product.
    pub fn cross(self, other: Vector2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vector2) -> f64 {
        (self - other).norm()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn unit(self) -> Option<Vector2> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(self / n)
        } else {
            None
        }
    }

    /// Counter-clockwise perpendicular `(-y, x)`.
    pub fn perp(self) -> Vector2 {
        Vector2::new(-self.y, self.x)
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate(self, angle: f64) -> Vector2 {
        let (s, c) = angle.sin_cos();
        Vector2::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }

    /// Polar angle in `(-π, π]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, k: f64) -> Vector2 {
        Vector2::new(self.x * k, self.y * k)
    }
}

impl Mul<Vector2> for f64 {
    type Output = Vector2;
    fn mul(self, v: Vector2) -> Vector2 {
        v * self
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;
    fn div(self, k: f64) -> Vector2 {
        Vector2::new(self.x / k, self.y / k)
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Vector2::new(x, y)
    }
}

/// Arithmetic mean of a point set (`None` when empty).
pub fn centroid(points: &[Vector2]) -> Option<Vector2> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector2::ZERO, |acc, &p| acc + p);
    Some(sum / points.len() as f64)
}

/// Infinite line through `p0` and `p1`.
///
/// The direction `p1 - p0` is never zero; [`Line2::new`] rejects coincident points.
/// Line parameter `t` measures multiples of `p1 - p0` from `p0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2 {
    p0: Vector2,
    p1: Vector2,
}

impl Line2 {
    pub fn new(p0: Vector2, p1: Vector2) -> Result<Self, FitError> {
        if !(p0.is_finite() && p1.is_finite()) {
            return Err(FitError::DegenerateGeometry("line endpoints must be finite".into()));
        }
        if p0 == p1 {
            return Err(FitError::DegenerateGeometry(
                "line endpoints must be distinct".into(),
            ));
        }
        Ok(Self { p0, p1 })
    }

    /// Line `{p : n·p = rho}` with normal `n = (-sin angle, cos angle)`.
    ///
    /// The direction of the line is `(cos angle, sin angle)`.
    pub fn from_angle_rho(angle: f64, rho: f64) -> Self {
        let u = Vector2::from_angle(angle);
        let p0 = u.perp() * rho;
        Self { p0, p1: p0 + u }
    }

    pub fn p0(&self) -> Vector2 {
        self.p0
    }

    pub fn p1(&self) -> Vector2 {
        self.p1
    }

    pub fn direction(&self) -> Vector2 {
        self.p1 - self.p0
    }

    pub fn unit(&self) -> Vector2 {
        let d = self.direction();
        d / d.norm()
    }

    /// Unit normal, counter-clockwise from [`Line2::unit`].
    pub fn perp(&self) -> Vector2 {
        self.unit().perp()
    }

    pub fn angle(&self) -> f64 {
        self.direction().angle()
    }

    /// Point at line parameter `t`.
    pub fn eval(&self, t: f64) -> Vector2 {
        self.p0 + self.direction() * t
    }

    /// Point at `x` on this line, or `None` for a vertical line.
    pub fn eval_at_x(&self, x: f64) -> Option<Vector2> {
        let d = self.direction();
        if d.x == 0.0 {
            return None;
        }
        Some(self.eval((x - self.p0.x) / d.x))
    }

    /// Signed perpendicular distance, positive on the left of the direction.
    pub fn signed_distance(&self, p: Vector2) -> f64 {
        self.perp().dot(p - self.p0)
    }

    /// Line parameter of the orthogonal projection of `p`.
    pub fn project(&self, p: Vector2) -> f64 {
        let d = self.direction();
        d.dot(p - self.p0) / d.norm_squared()
    }

    /// Intersection with another line, `None` if they are parallel.
    pub fn intersect(&self, other: &Line2) -> Option<Vector2> {
        let d0 = self.direction();
        let d1 = other.direction();
        let denom = d0.cross(d1);
        if denom.abs() <= f64::EPSILON * d0.norm() * d1.norm() {
            return None;
        }
        let t = (other.p0 - self.p0).cross(d1) / denom;
        Some(self.eval(t))
    }
}

/// Axis-aligned rectangle spanning `[x0, x1] × [y0, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect2 {
    /// Build from two opposite corners in any order.
    pub fn from_corners(a: Vector2, b: Vector2) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    /// Bounding box of a point set.
    pub fn bounding(points: &[Vector2]) -> Option<Self> {
        let first = *points.first()?;
        Some(points[1..].iter().fold(Self::from_corners(first, first), |r, p| Self {
            x0: r.x0.min(p.x),
            y0: r.y0.min(p.y),
            x1: r.x1.max(p.x),
            y1: r.y1.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(0.5 * (self.x0 + self.x1), 0.5 * (self.y0 + self.y1))
    }

    /// A rectangle without finite positive area.
    pub fn is_empty(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }

    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Points of `points` inside this rectangle, in their original order.
    pub fn select(&self, points: &[Vector2]) -> Vec<Vector2> {
        points.iter().copied().filter(|&p| self.contains(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rotate_quarter_turn() {
        let v = Vector2::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert!(v.x.abs() < 1e-15);
        assert_relative_eq!(v.y, 1.0);
        assert_eq!(Vector2::new(2.0, 3.0).perp(), Vector2::new(-3.0, 2.0));
    }

    #[test]
    fn zero_length_line_is_rejected() {
        let p = Vector2::new(1.0, 1.0);
        assert!(matches!(Line2::new(p, p), Err(FitError::DegenerateGeometry(_))));
    }

    #[test]
    fn line_intersection_and_distance() {
        let a = Line2::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0)).unwrap();
        let b = Line2::new(Vector2::new(0.0, 2.0), Vector2::new(2.0, 0.0)).unwrap();
        let x = a.intersect(&b).unwrap();
        assert_relative_eq!(x.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-12);

        let h = Line2::new(Vector2::new(0.0, 1.0), Vector2::new(1.0, 1.0)).unwrap();
        assert!(h.intersect(&Line2::new(Vector2::ZERO, Vector2::new(5.0, 0.0)).unwrap()).is_none());
        assert_relative_eq!(h.signed_distance(Vector2::new(3.0, 4.0)), 3.0);
        assert_relative_eq!(h.signed_distance(Vector2::new(3.0, -1.0)), -2.0);
        assert_relative_eq!(h.eval_at_x(7.0).unwrap().y, 1.0);
    }

    #[test]
    fn angle_rho_form_matches_normal_equation() {
        let line = Line2::from_angle_rho(0.3, 2.5);
        let n = Vector2::new(-(0.3f64).sin(), (0.3f64).cos());
        for t in [-3.0, 0.0, 4.5] {
            assert_relative_eq!(n.dot(line.eval(t)), 2.5, epsilon = 1e-12);
        }
        assert_relative_eq!(line.angle(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn rect_bounding_and_select() {
        let pts = [Vector2::new(1.0, 5.0), Vector2::new(-2.0, 3.0), Vector2::new(4.0, -1.0)];
        let r = Rect2::bounding(&pts).unwrap();
        assert_eq!((r.x0, r.y0, r.x1, r.y1), (-2.0, -1.0, 4.0, 5.0));
        assert!(!r.is_empty());
        assert!(Rect2::from_corners(Vector2::ZERO, Vector2::new(0.0, 3.0)).is_empty());

        let roi = Rect2::from_corners(Vector2::new(0.0, 0.0), Vector2::new(5.0, 5.0));
        assert_eq!(roi.select(&pts), vec![Vector2::new(1.0, 5.0)]);
    }
}
