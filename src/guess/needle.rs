//! Needle axis estimate from a sweep of projection histograms.
//!
//! Projecting both needle edges onto the axis normal piles the points into two sharp
//! histogram peaks. Each sweep angle is scored by the combined prominence of its two
//! strongest peaks; the best angle gives the rotation, and the peak pair gives the axis
//! offset and the radius.

use std::f64::consts::PI;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{NeedleParams, Vector2};
use crate::error::FitError;
use crate::math::{histogram, local_maxima, peak_prominences};

/// Number of normal directions tried over `[0, π)`.
pub const NEEDLE_SWEEP_STEPS: usize = 180;

const MIN_BINS: usize = 8;
const MAX_BINS: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct PeakPair {
    rho: f64,
    radius: f64,
    score: f64,
}

pub fn needle_guess(data: &[Vector2]) -> Result<NeedleParams, FitError> {
    FitError::check_len(data.len(), 3)?;

    let bins = (data.len() / 4).clamp(MIN_BINS, MAX_BINS);
    let sweep: Vec<Option<PeakPair>> = (0..NEEDLE_SWEEP_STEPS)
        .into_par_iter()
        .map(|i| peak_pair(data, sweep_angle(i), bins))
        .collect();

    let scores: Vec<f64> = sweep.iter().map(|p| p.map_or(0.0, |p| p.score)).collect();
    let n = scores.len();
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for i in 0..n {
        // Circular: the direction just below π neighbours zero.
        let smoothed = (scores[(i + n - 1) % n] + scores[i] + scores[(i + 1) % n]) / 3.0;
        if smoothed > best_score {
            best = i;
            best_score = smoothed;
        }
    }

    let pair = sweep[best].ok_or_else(|| {
        FitError::DegenerateGeometry("no pair of needle edges found in projection sweep".into())
    })?;
    let rotation = sweep_angle(best);
    debug!(rotation, rho = pair.rho, radius = pair.radius, score = best_score, "needle guess");

    Ok(NeedleParams {
        rotation,
        rho: pair.rho,
        radius: pair.radius,
    })
}

fn sweep_angle(i: usize) -> f64 {
    PI * i as f64 / NEEDLE_SWEEP_STEPS as f64
}

/// Two most prominent peaks of the projection histogram onto `(cos θ, sin θ)`.
fn peak_pair(data: &[Vector2], theta: f64, bins: usize) -> Option<PeakPair> {
    let normal = Vector2::from_angle(theta);
    let proj: Vec<f64> = data.iter().map(|&p| normal.dot(p)).collect();
    let lo = proj.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = proj.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (hi - lo) / bins as f64;
    if !(width > 0.0 && width.is_finite()) {
        return None;
    }

    // Zero padding so edge bins can be peaks.
    let mut counts = Vec::with_capacity(bins + 2);
    counts.push(0.0);
    counts.extend(histogram(&proj, bins).into_iter().map(|c| c as f64));
    counts.push(0.0);

    let peaks = local_maxima(&counts);
    if peaks.len() < 2 {
        return None;
    }
    let prominences = peak_prominences(&counts, &peaks);
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    // Stable: equal prominences keep the lower bin first.
    order.sort_by(|&a, &b| prominences[b].total_cmp(&prominences[a]));

    let centre = |k: usize| lo + (k as f64 - 0.5) * width;
    let (a, b) = (centre(peaks[order[0]]), centre(peaks[order[1]]));
    Some(PeakPair {
        rho: 0.5 * (a + b),
        radius: 0.5 * (a - b).abs(),
        score: (prominences[order[0]] + prominences[order[1]]) / data.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::needle_edges;

    fn check(truth: NeedleParams, length: f64) {
        let data = needle_edges(&truth, length, 40);
        let guess = needle_guess(&data).unwrap();
        assert!((guess.rotation - truth.rotation).abs() < 0.03, "rotation {}", guess.rotation);
        assert!((guess.rho - truth.rho).abs() < 1.0, "rho {}", guess.rho);
        assert!((guess.radius - truth.radius).abs() < 1.0, "radius {}", guess.radius);
    }

    #[test]
    fn finds_needle_on_sweep_angle() {
        check(
            NeedleParams {
                rotation: sweep_angle(23),
                rho: 10.0,
                radius: 3.0,
            },
            50.0,
        );
    }

    #[test]
    fn finds_needle_between_sweep_angles() {
        check(
            NeedleParams {
                rotation: 1.2,
                rho: -20.0,
                radius: 4.0,
            },
            60.0,
        );
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let data = vec![Vector2::new(1.0, 1.0); 20];
        assert!(matches!(
            needle_guess(&data),
            Err(FitError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn too_few_points() {
        let data = [Vector2::ZERO, Vector2::new(1.0, 1.0)];
        assert!(matches!(
            needle_guess(&data),
            Err(FitError::InsufficientData { .. })
        ));
    }
}
