//! The CPU reference pyramid, the fallback target.
//!
//! Always available, always correct. Built on the same kernels as the host
//! device emulation, so a fallen-back stage reproduces the device result
//! exactly.

use pyr_compute::kernels;
use pyr_compute::PyramidSchedule;
use pyr_core::{Image, PixelKind};

use crate::PipelineResult;

/// CPU collaborator a stage delegates to when the device path is off.
pub trait CpuPyramidFilter: Send + Sync {
    /// Build every level, coarsest first.
    fn run(
        &self,
        input: &Image,
        schedule: &PyramidSchedule,
        output_kind: PixelKind,
    ) -> PipelineResult<Vec<Image>>;
}

/// Reference implementation over the shared kernels.
#[derive(Debug, Default)]
pub struct ReferencePyramid;

impl ReferencePyramid {
    /// Create the reference filter.
    pub fn new() -> Self {
        Self
    }
}

impl CpuPyramidFilter for ReferencePyramid {
    fn run(
        &self,
        input: &Image,
        schedule: &PyramidSchedule,
        output_kind: PixelKind,
    ) -> PipelineResult<Vec<Image>> {
        schedule.validate(input.dimension())?;

        let mut base = Image::new(output_kind, input.size())?;
        kernels::cast_into(input, &mut base)?;

        let mut levels = Vec::with_capacity(schedule.levels);
        for level in 0..schedule.levels {
            let sigmas = &schedule.smoothing[level];
            let factors = &schedule.rescale[level];

            let smoothed = if sigmas.iter().any(|&s| s > 0.0) {
                let mut out = Image::new(output_kind, base.size())?;
                kernels::smooth_into(&base, sigmas, &mut out)?;
                out
            } else {
                base.clone()
            };

            let level_image = if factors.iter().any(|&f| f > 1) {
                let size = kernels::shrunk_size(base.size(), factors);
                let mut out = Image::new(output_kind, &size)?;
                if schedule.use_shrink {
                    kernels::shrink_into(&smoothed, factors, &mut out)?;
                } else {
                    kernels::resample_into(&smoothed, &mut out)?;
                }
                out
            } else {
                smoothed
            };
            levels.push(level_image);
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_level_shapes() {
        let input = Image::new(PixelKind::U8, &[16, 12, 8]).unwrap();
        let schedule = PyramidSchedule::default_shrink(3, 3);
        let levels = ReferencePyramid::new()
            .run(&input, &schedule, PixelKind::F32)
            .unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].size(), &[4, 3, 2]);
        assert_eq!(levels[2].size(), &[16, 12, 8]);
    }

    #[test]
    fn test_reference_rejects_bad_schedule() {
        let input = Image::new(PixelKind::F32, &[8, 8]).unwrap();
        // 3-axis schedule against a 2D image
        let schedule = PyramidSchedule::default_for(2, 3);
        assert!(ReferencePyramid::new()
            .run(&input, &schedule, PixelKind::F32)
            .is_err());
    }
}
