//! Small descriptive-statistics helpers used by the initial-guess estimators.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated quantile, `q ∈ [0, 1]`. Non-finite values are ignored.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Equal-width histogram over `[min, max]` of the data.
///
/// The last bin is closed on the right. A constant input puts everything in the
/// middle bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if bins == 0 || values.is_empty() {
        return counts;
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = hi - lo;
    for &v in values {
        let ix = if width > 0.0 {
            (((v - lo) / width) * bins as f64).floor() as usize
        } else {
            bins / 2
        };
        counts[ix.min(bins - 1)] += 1;
    }
    counts
}

/// Box-filter moving average over full windows only.
///
/// Produces `len - window + 1` values; a window longer than the input yields nothing.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Indices of local maxima. A flat-topped peak reports the middle of its plateau.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Topographic prominence of each peak.
///
/// For each side the search runs until a strictly higher sample or the array edge; the
/// prominence is the peak height above the higher of the two side minima.
pub fn peak_prominences(values: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks
        .iter()
        .map(|&p| {
            let height = values[p];

            let mut left_min = height;
            for &v in values[..p].iter().rev() {
                if v > height {
                    break;
                }
                left_min = left_min.min(v);
            }

            let mut right_min = height;
            for &v in &values[p + 1..] {
                if v > height {
                    break;
                }
                right_min = right_min.min(v);
            }

            height - left_min.max(right_min)
        })
        .collect()
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}
