//! Pyramid level schedules.

use crate::{ComputeError, ComputeResult};

/// Per-level rescale and smoothing schedules for one pyramid.
///
/// Levels are ordered coarsest first. Each rescale entry holds one integer
/// factor per axis; each smoothing entry one sigma (pixel units) per axis.
#[derive(Debug, Clone)]
pub struct PyramidSchedule {
    /// Number of resolution levels.
    pub levels: usize,
    /// Per-level, per-axis downsampling factors.
    pub rescale: Vec<Vec<u32>>,
    /// Per-level, per-axis gaussian sigmas.
    pub smoothing: Vec<Vec<f64>>,
    /// Downsample with the shrink filter (subsampling) instead of resampling.
    pub use_shrink: bool,
}

impl PyramidSchedule {
    /// Default schedule: factor `2^(levels-1-l)` per axis, sigma half the
    /// factor, no smoothing at factor 1.
    pub fn default_for(levels: usize, dimension: usize) -> Self {
        let mut rescale = Vec::with_capacity(levels);
        let mut smoothing = Vec::with_capacity(levels);
        for level in 0..levels {
            let factor = 1u32 << (levels - 1 - level) as u32;
            rescale.push(vec![factor; dimension]);
            let sigma = if factor > 1 { 0.5 * factor as f64 } else { 0.0 };
            smoothing.push(vec![sigma; dimension]);
        }
        Self { levels, rescale, smoothing, use_shrink: false }
    }

    /// Same defaults, downsampling by subsampling.
    pub fn default_shrink(levels: usize, dimension: usize) -> Self {
        Self {
            use_shrink: true,
            ..Self::default_for(levels, dimension)
        }
    }

    /// Check the schedules against a level count and spatial dimension.
    pub fn validate(&self, dimension: usize) -> ComputeResult<()> {
        if self.levels == 0 {
            return Err(ComputeError::ScheduleMismatch { levels: 0, entries: 0 });
        }
        for schedule_len in [self.rescale.len(), self.smoothing.len()] {
            if schedule_len != self.levels {
                return Err(ComputeError::ScheduleMismatch {
                    levels: self.levels,
                    entries: schedule_len,
                });
            }
        }
        for entry in &self.rescale {
            if entry.len() != dimension || entry.iter().any(|&f| f == 0) {
                return Err(ComputeError::InvalidInput(format!(
                    "rescale entry {entry:?} invalid for dimension {dimension}"
                )));
            }
        }
        for entry in &self.smoothing {
            if entry.len() != dimension {
                return Err(ComputeError::InvalidInput(format!(
                    "smoothing entry {entry:?} invalid for dimension {dimension}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_shape() {
        let s = PyramidSchedule::default_for(3, 2);
        assert_eq!(s.rescale, vec![vec![4, 4], vec![2, 2], vec![1, 1]]);
        assert_eq!(s.smoothing[0], vec![2.0, 2.0]);
        assert_eq!(s.smoothing[2], vec![0.0, 0.0]);
        assert!(s.validate(2).is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatches() {
        let mut s = PyramidSchedule::default_for(2, 3);
        assert!(s.validate(2).is_err());
        s.rescale.pop();
        assert!(s.validate(3).is_err());
        assert!(PyramidSchedule::default_for(0, 2).validate(2).is_err());
    }
}
