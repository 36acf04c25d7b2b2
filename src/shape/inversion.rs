//! Height → arclength lookup for the rising part of a profile.

/// Sorted `(z, s)` samples from the apex up to the first height maximum.
///
/// Samples are appended while the profile climbs. Once the turning point has been
/// appended the table is marked solved and never grows again.
#[derive(Debug, Clone)]
pub struct HeightInversion {
    z: Vec<f64>,
    s: Vec<f64>,
    solved: bool,
}

impl Default for HeightInversion {
    fn default() -> Self {
        Self {
            z: vec![0.0],
            s: vec![0.0],
            solved: false,
        }
    }
}

impl HeightInversion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, z: f64, s: f64) {
        if self.solved || z <= self.max_z() {
            return;
        }
        self.z.push(z);
        self.s.push(s);
    }

    pub fn mark_solved(&mut self) {
        self.solved = true;
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Highest tabulated `z` (the turning point once solved).
    pub fn max_z(&self) -> f64 {
        self.z.last().copied().unwrap_or(0.0)
    }

    /// Arclength of the highest tabulated sample.
    pub fn last_s(&self) -> f64 {
        self.s.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Interpolated arclength at height `z`, `None` outside the tabulated range.
    pub fn lookup(&self, z: f64) -> Option<f64> {
        if !(z >= 0.0 && z <= self.max_z()) {
            return None;
        }
        let hi = self.z.partition_point(|&v| v < z);
        if hi == 0 {
            return Some(self.s[0]);
        }
        let lo = hi - 1;
        let t = (z - self.z[lo]) / (self.z[hi] - self.z[lo]);
        Some(self.s[lo] + t * (self.s[hi] - self.s[lo]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_interpolates_between_samples() {
        let mut inv = HeightInversion::new();
        inv.push(1.0, 2.0);
        inv.push(3.0, 3.0);
        assert_eq!(inv.lookup(0.5), Some(1.0));
        assert_eq!(inv.lookup(2.0), Some(2.5));
        assert_eq!(inv.lookup(3.0), Some(3.0));
        assert_eq!(inv.lookup(3.5), None);
        assert_eq!(inv.lookup(-0.1), None);
    }

    #[test]
    fn solved_table_stops_growing() {
        let mut inv = HeightInversion::new();
        inv.push(1.0, 1.0);
        inv.mark_solved();
        inv.push(2.0, 2.0);
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.max_z(), 1.0);
    }

    #[test]
    fn non_increasing_samples_are_ignored() {
        let mut inv = HeightInversion::new();
        inv.push(1.0, 1.0);
        inv.push(0.5, 2.0);
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.last_s(), 1.0);
    }
}
