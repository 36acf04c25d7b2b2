//! Parameter vectors and fit result records.
//!
//! Results are plain immutable values: they are created once at the end of a fit and
//! carry no behaviour beyond field access and a few derived views. All of them
//! serialize with `serde` so callers can persist or ship them as they like.

use serde::{Deserialize, Serialize};

use crate::domain::{Line2, StopReason, Vector2};
use crate::error::FitError;

fn expect_len(values: &[f64], n: usize) -> Result<(), FitError> {
    if values.len() != n {
        return Err(FitError::InvalidConfig(format!(
            "expected {n} parameters, got {}",
            values.len()
        )));
    }
    Ok(())
}

/// Young–Laplace drop parameters.
///
/// `rotation` is the angle of the drop's local `r` axis from the image `x` axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoungLaplaceParams {
    pub bond: f64,
    pub radius: f64,
    pub apex_x: f64,
    pub apex_y: f64,
    pub rotation: f64,
}

impl YoungLaplaceParams {
    pub const LEN: usize = 5;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.bond, self.radius, self.apex_x, self.apex_y, self.rotation]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, FitError> {
        expect_len(p, Self::LEN)?;
        Ok(Self {
            bond: p[0],
            radius: p[1],
            apex_x: p[2],
            apex_y: p[3],
            rotation: p[4],
        })
    }

    pub fn apex(&self) -> Vector2 {
        Vector2::new(self.apex_x, self.apex_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleParams {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl CircleParams {
    pub const LEN: usize = 3;

    pub fn new(center: Vector2, radius: f64) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            radius,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.center_x, self.center_y, self.radius]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, FitError> {
        expect_len(p, Self::LEN)?;
        Ok(Self {
            center_x: p[0],
            center_y: p[1],
            radius: p[2],
        })
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.center_x, self.center_y)
    }
}

/// Line `{p : (-sin angle, cos angle)·p = rho}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    pub angle: f64,
    pub rho: f64,
}

impl LineParams {
    pub const LEN: usize = 2;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.angle, self.rho]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, FitError> {
        expect_len(p, Self::LEN)?;
        Ok(Self {
            angle: p[0],
            rho: p[1],
        })
    }

    pub fn line(&self) -> Line2 {
        Line2::from_angle_rho(self.angle, self.rho)
    }
}

/// Needle parameters.
///
/// The needle axis is the line `{p : (cos rotation, sin rotation)·p = rho}` and the two
/// edges sit `radius` to either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeedleParams {
    pub rotation: f64,
    pub rho: f64,
    pub radius: f64,
}

impl NeedleParams {
    pub const LEN: usize = 3;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.rotation, self.rho, self.radius]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, FitError> {
        expect_len(p, Self::LEN)?;
        Ok(Self {
            rotation: p[0],
            rho: p[1],
            radius: p[2],
        })
    }

    /// Unit normal to the needle axis.
    pub fn normal(&self) -> Vector2 {
        Vector2::from_angle(self.rotation)
    }

    /// Unit vector along the needle axis.
    pub fn axis(&self) -> Vector2 {
        self.normal().perp()
    }
}

/// Driver statistics shared by every fit result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStats {
    /// Sum of squared residuals over degrees of freedom (`n - p + 1`).
    pub objective: f64,
    pub iterations: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleFitResult {
    pub params: CircleParams,
    pub residuals: Vec<f64>,
    pub stats: FitStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineFitResult {
    pub params: LineParams,
    pub residuals: Vec<f64>,
    pub stats: FitStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedleFitResult {
    pub params: NeedleParams,
    pub residuals: Vec<f64>,
    /// `true` for points on the edge at negative offset from the axis.
    pub left_mask: Vec<bool>,
    pub stats: FitStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoungLaplaceFitResult {
    pub params: YoungLaplaceParams,
    pub residuals: Vec<f64>,
    /// Signed dimensionless arclength of each point's closest profile point.
    pub arclengths: Vec<f64>,
    /// Drop volume up to the furthest data point, in cubed data units.
    pub volume: f64,
    /// Drop surface area up to the furthest data point, in squared data units.
    pub surface_area: f64,
    pub stats: FitStats,
}

/// Which model an arc fit settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcBranch {
    Line,
    Circle,
}

/// Fit of one side of a sessile drop near its contact point.
///
/// Angles are in radians, measured inside the drop from the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcFit {
    pub branch: ArcBranch,
    pub angle: f64,
    /// `1 / radius` for circle arcs (negative when the arc centre lies inside the
    /// contact), zero for lines.
    pub curvature: f64,
    /// Contact point in image coordinates, if the arc reaches the baseline.
    pub contact: Option<Vector2>,
    /// Arc centre in image coordinates (circle branch only).
    pub center: Option<Vector2>,
    /// Residuals of the fitted points, in the order they appear in the input.
    pub residuals: Vec<f64>,
    /// Arclength of each fitted point from the contact, same order as `residuals`.
    pub arclengths: Vec<f64>,
    /// Which input points took part in this fit.
    pub mask: Vec<bool>,
    pub stats: FitStats,
}

/// Both sides of a contact-angle fit. Each side succeeds or fails on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactAngleFitResult {
    pub left: Result<ArcFit, FitError>,
    pub right: Result<ArcFit, FitError>,
}
