//! Dormand–Prince 5(4) integrator with dense output.
//!
//! The stepper advances a fixed-size state `[f64; N]` one accepted step at a time and
//! hands back a [`DenseSegment`] for every step. A segment is a 4th-order continuous
//! extension (Hairer's DOPRI5 interpolant), so callers can cache segments and evaluate
//! anywhere inside them without re-integrating.
//!
//! Step-size control:
//! - error norm is RMS of `err_i / (atol + rtol * max(|y0_i|, |y1_i|))`
//! - growth factor `0.9 * err^(-1/5)` clamped to `[0.2, 10]`
//! - a step shrinking below [`MIN_STEP`] or a non-finite state fails the integration

use crate::error::FitError;

pub const MIN_STEP: f64 = 1e-12;

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; 7] = [
    [0.0; 6],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];

/// 5th-order weights (identical to the last row of `A`, FSAL).
const B: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

/// Difference between the 5th and embedded 4th order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Dense output weights.
const D: [f64; 7] = [
    -12715105075.0 / 11282082432.0,
    0.0,
    87487479700.0 / 32700410799.0,
    -10690763975.0 / 1880347072.0,
    701980252875.0 / 199316789632.0,
    -1453857185.0 / 822651844.0,
    69997945.0 / 29380423.0,
];

/// Right-hand side of `dy/dt = f(t, y)`.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

/// Continuous extension over one accepted step `[t0, t0 + h]`.
#[derive(Debug, Clone)]
pub struct DenseSegment<const N: usize> {
    t0: f64,
    h: f64,
    coeffs: [[f64; N]; 5],
}

impl<const N: usize> DenseSegment<N> {
    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn t1(&self) -> f64 {
        self.t0 + self.h
    }

    /// Interpolated state at `t` (extrapolates outside the segment).
    pub fn eval(&self, t: f64) -> [f64; N] {
        let theta = (t - self.t0) / self.h;
        let theta1 = 1.0 - theta;
        let [r1, r2, r3, r4, r5] = &self.coeffs;
        std::array::from_fn(|i| {
            r1[i] + theta * (r2[i] + theta1 * (r3[i] + theta * (r4[i] + theta1 * r5[i])))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperStatus {
    Running,
    Finished,
    Failed,
}

/// Adaptive Dormand–Prince stepper bounded at `t_bound`.
#[derive(Debug, Clone)]
pub struct Dopri5<S, const N: usize> {
    system: S,
    t: f64,
    y: [f64; N],
    f: [f64; N],
    h: f64,
    t_bound: f64,
    rtol: f64,
    atol: f64,
    status: StepperStatus,
}

impl<S: OdeSystem<N>, const N: usize> Dopri5<S, N> {
    pub fn new(system: S, t0: f64, y0: [f64; N], t_bound: f64) -> Self {
        let f = system.rhs(t0, &y0);
        Self {
            system,
            t: t0,
            y: y0,
            f,
            h: 0.01,
            t_bound,
            rtol: 1e-8,
            atol: 1e-10,
            status: StepperStatus::Running,
        }
    }

    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_initial_step(mut self, h: f64) -> Self {
        self.h = h;
        self
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn y(&self) -> &[f64; N] {
        &self.y
    }

    pub fn status(&self) -> StepperStatus {
        self.status
    }

    /// Take one accepted step.
    ///
    /// Returns `Ok(None)` once `t_bound` has been reached. After a failure the
    /// stepper stays failed and keeps returning the same error.
    pub fn step(&mut self) -> Result<Option<DenseSegment<N>>, FitError> {
        match self.status {
            StepperStatus::Finished => return Ok(None),
            StepperStatus::Failed => {
                return Err(FitError::numerical(format!(
                    "integration failed at t = {}",
                    self.t
                )));
            }
            StepperStatus::Running => {}
        }
        if self.t >= self.t_bound {
            self.status = StepperStatus::Finished;
            return Ok(None);
        }

        loop {
            let remaining = self.t_bound - self.t;
            let (h, clipped) = if self.h >= remaining {
                (remaining, true)
            } else {
                (self.h, false)
            };
            if !clipped && h < MIN_STEP {
                return self.fail();
            }

            let (y1, k) = self.stages(h);
            let err = self.error_norm(h, &y1, &k);

            if !err.is_finite() || y1.iter().any(|v| !v.is_finite()) {
                return self.fail();
            }

            if err <= 1.0 {
                let segment = self.dense(h, &y1, &k);
                self.t = if clipped { self.t_bound } else { self.t + h };
                self.y = y1;
                self.f = k[6];
                let factor = if err == 0.0 {
                    10.0
                } else {
                    (0.9 * err.powf(-0.2)).clamp(0.2, 10.0)
                };
                self.h = h * factor;
                return Ok(Some(segment));
            }

            self.h = h * (0.9 * err.powf(-0.2)).max(0.2);
        }
    }

    fn fail(&mut self) -> Result<Option<DenseSegment<N>>, FitError> {
        self.status = StepperStatus::Failed;
        Err(FitError::numerical(format!(
            "integration failed at t = {}",
            self.t
        )))
    }

    fn stages(&self, h: f64) -> ([f64; N], [[f64; N]; 7]) {
        let mut k = [[0.0; N]; 7];
        k[0] = self.f;
        for s in 1..7 {
            let mut ys = self.y;
            for (j, kj) in k.iter().enumerate().take(s) {
                let a = A[s][j];
                if a != 0.0 {
                    for i in 0..N {
                        ys[i] += h * a * kj[i];
                    }
                }
            }
            k[s] = self.system.rhs(self.t + C[s] * h, &ys);
        }

        let mut y1 = self.y;
        for (s, ks) in k.iter().enumerate() {
            if B[s] != 0.0 {
                for i in 0..N {
                    y1[i] += h * B[s] * ks[i];
                }
            }
        }
        (y1, k)
    }

    fn error_norm(&self, h: f64, y1: &[f64; N], k: &[[f64; N]; 7]) -> f64 {
        let mut acc = 0.0;
        for i in 0..N {
            let e: f64 = h * (0..7).map(|s| E[s] * k[s][i]).sum::<f64>();
            let scale = self.atol + self.rtol * self.y[i].abs().max(y1[i].abs());
            acc += (e / scale).powi(2);
        }
        (acc / N as f64).sqrt()
    }

    fn dense(&self, h: f64, y1: &[f64; N], k: &[[f64; N]; 7]) -> DenseSegment<N> {
        let mut coeffs = [[0.0; N]; 5];
        for i in 0..N {
            let dy = y1[i] - self.y[i];
            let bspl = h * k[0][i] - dy;
            coeffs[0][i] = self.y[i];
            coeffs[1][i] = dy;
            coeffs[2][i] = bspl;
            coeffs[3][i] = dy - h * k[6][i] - bspl;
            coeffs[4][i] = h * (0..7).map(|s| D[s] * k[s][i]).sum::<f64>();
        }
        DenseSegment {
            t0: self.t,
            h,
            coeffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Harmonic oscillator: y'' = -y.
    struct Oscillator;

    impl OdeSystem<2> for Oscillator {
        fn rhs(&self, _t: f64, y: &[f64; 2]) -> [f64; 2] {
            [y[1], -y[0]]
        }
    }

    struct Blowup;

    impl OdeSystem<1> for Blowup {
        fn rhs(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [y[0] * y[0]]
        }
    }

    #[test]
    fn oscillator_matches_closed_form_at_steps_and_between() {
        let mut stepper = Dopri5::new(Oscillator, 0.0, [0.0, 1.0], 6.0);
        let mut segments = Vec::new();
        while let Some(seg) = stepper.step().unwrap() {
            segments.push(seg);
        }
        assert_eq!(stepper.status(), StepperStatus::Finished);
        assert_relative_eq!(stepper.t(), 6.0);
        assert_relative_eq!(stepper.y()[0], 6.0f64.sin(), epsilon = 1e-8);

        for seg in &segments {
            let mid = 0.5 * (seg.t0() + seg.t1());
            let y = seg.eval(mid);
            assert_relative_eq!(y[0], mid.sin(), epsilon = 1e-7);
            assert_relative_eq!(y[1], mid.cos(), epsilon = 1e-7);
        }
    }

    #[test]
    fn dense_segment_interpolates_endpoints() {
        let mut stepper = Dopri5::new(Oscillator, 0.0, [0.0, 1.0], 1.0);
        let seg = stepper.step().unwrap().unwrap();
        assert_eq!(seg.eval(seg.t0()), [0.0, 1.0]);
        let end = seg.eval(seg.t1());
        assert_relative_eq!(end[0], stepper.y()[0], epsilon = 1e-14);
    }

    #[test]
    fn finite_time_blowup_fails() {
        // y = 1 / (1 - t) diverges at t = 1.
        let mut stepper = Dopri5::new(Blowup, 0.0, [1.0], 2.0);
        let outcome = loop {
            match stepper.step() {
                Ok(Some(_)) => continue,
                other => break other,
            }
        };
        assert!(outcome.is_err());
        assert_eq!(stepper.status(), StepperStatus::Failed);
        // Explicit steps lag the singularity slightly; failure must still happen there.
        assert!((stepper.t() - 1.0).abs() < 1e-6, "failed at t = {}", stepper.t());
    }
}
