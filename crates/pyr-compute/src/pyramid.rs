//! The device-side multi-resolution pyramid filter graph.
//!
//! Constructed purely through factory directory lookups; concrete filter
//! types stay behind [`DeviceFilter`]. A missing factory at any lookup is a
//! construction failure the pipeline stage absorbs by falling back to CPU.

use std::mem;
use std::sync::Arc;

use tracing::debug;

use pyr_core::PixelKind;

use crate::context::{ComputeContext, DeviceImage};
use crate::directory::FactoryDirectory;
use crate::family::FilterFamily;
use crate::filter::{DeviceFilter, FilterParams};
use crate::kernels::shrunk_size;
use crate::matrix::FactoryKey;
use crate::schedule::PyramidSchedule;
use crate::{ComputeError, ComputeResult};

/// Device pyramid: cast, per-level smoothing, per-level downsampling.
///
/// Levels are computed independently from the cast input (not cascaded),
/// coarsest first, per the schedule.
pub struct GpuPyramid {
    ctx: Arc<dyn ComputeContext>,
    schedule: PyramidSchedule,
    input_kind: PixelKind,
    output_kind: PixelKind,
    dimension: usize,
    cast: Box<dyn DeviceFilter>,
    smooth: Box<dyn DeviceFilter>,
    resize: Box<dyn DeviceFilter>,
    input: Option<DeviceImage>,
    outputs: Vec<DeviceImage>,
}

impl std::fmt::Debug for GpuPyramid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuPyramid")
            .field("schedule", &self.schedule)
            .field("input_kind", &self.input_kind)
            .field("output_kind", &self.output_kind)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl GpuPyramid {
    /// Resolve the filter graph from the directory.
    ///
    /// Requires a transaction to be open: cast, smoothing, and shrink or
    /// resample factories must be live (resample pulls its transform and
    /// interpolator itself).
    pub fn from_directory(
        directory: &FactoryDirectory,
        ctx: Arc<dyn ComputeContext>,
        input_kind: PixelKind,
        output_kind: PixelKind,
        dimension: usize,
        schedule: PyramidSchedule,
    ) -> ComputeResult<Self> {
        schedule.validate(dimension)?;

        let cast = directory.create_filter(
            &FactoryKey::dual(FilterFamily::Cast, input_kind, output_kind, dimension),
            &ctx,
        )?;
        let smooth = directory.create_filter(
            &FactoryKey::dual(
                FilterFamily::RecursiveGaussian,
                output_kind,
                output_kind,
                dimension,
            ),
            &ctx,
        )?;
        let resize_family = if schedule.use_shrink {
            FilterFamily::Shrink
        } else {
            FilterFamily::Resample
        };
        let resize = directory.create_filter(
            &FactoryKey::dual(resize_family, output_kind, output_kind, dimension),
            &ctx,
        )?;
        debug!(
            device = ctx.device_name(),
            levels = schedule.levels,
            "constructed device pyramid graph"
        );

        Ok(Self {
            ctx,
            schedule,
            input_kind,
            output_kind,
            dimension,
            cast,
            smooth,
            resize,
            input: None,
            outputs: Vec::new(),
        })
    }

    /// Number of configured levels.
    pub fn levels(&self) -> usize {
        self.schedule.levels
    }

    /// Attach the device-resident input image.
    pub fn set_input(&mut self, input: DeviceImage) -> ComputeResult<()> {
        let host = input.host();
        if host.dimension() != self.dimension {
            return Err(ComputeError::InvalidInput(format!(
                "input dimension {} != pyramid dimension {}",
                host.dimension(),
                self.dimension
            )));
        }
        if host.kind() != self.input_kind {
            return Err(ComputeError::InvalidInput(format!(
                "input kind {} != pyramid input kind {}",
                host.kind(),
                self.input_kind
            )));
        }
        self.input = Some(input);
        Ok(())
    }

    /// Run the graph: synchronous device dispatch, blocks until every level
    /// is complete.
    pub fn update(&mut self) -> ComputeResult<()> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ComputeError::InvalidInput("pyramid has no input".into()))?;

        let base = self.cast.apply(
            &self.ctx,
            input,
            &FilterParams {
                output_kind: Some(self.output_kind),
                ..Default::default()
            },
        )?;

        let mut outputs = Vec::with_capacity(self.schedule.levels);
        for level in 0..self.schedule.levels {
            let sigmas = &self.schedule.smoothing[level];
            let factors = &self.schedule.rescale[level];

            let smoothed = if sigmas.iter().any(|&s| s > 0.0) {
                self.smooth.apply(
                    &self.ctx,
                    &base,
                    &FilterParams { sigmas: sigmas.clone(), ..Default::default() },
                )?
            } else {
                // Independent copy so levels never alias.
                self.cast.apply(
                    &self.ctx,
                    &base,
                    &FilterParams {
                        output_kind: Some(self.output_kind),
                        ..Default::default()
                    },
                )?
            };

            let level_image = if factors.iter().any(|&f| f > 1) {
                let params = FilterParams {
                    shrink_factors: factors.clone(),
                    output_size: shrunk_size(base.host().size(), factors),
                    ..Default::default()
                };
                self.resize.apply(&self.ctx, &smoothed, &params)?
            } else {
                smoothed
            };
            outputs.push(level_image);
        }
        self.outputs = outputs;
        Ok(())
    }

    /// Take the computed level images, coarsest first (zero-copy hand-off).
    pub fn take_outputs(&mut self) -> ComputeResult<Vec<DeviceImage>> {
        if self.outputs.is_empty() {
            return Err(ComputeError::InvalidInput(
                "pyramid has not been updated".into(),
            ));
        }
        Ok(mem::take(&mut self.outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PYRAMID_FAMILIES;
    use crate::host::{HostContext, HostProvider};
    use crate::matrix::TypeMatrix;
    use crate::transaction::RegistrationTransaction;
    use pyr_core::Image;

    fn build(
        schedule: PyramidSchedule,
        input_kind: PixelKind,
        output_kind: PixelKind,
        dim: usize,
    ) -> (GpuPyramid, RegistrationTransaction) {
        let directory = Arc::new(FactoryDirectory::new());
        let txn = RegistrationTransaction::open(
            directory.clone(),
            &TypeMatrix::default(),
            &PYRAMID_FAMILIES,
            &HostProvider::new(),
        )
        .unwrap();
        let ctx: Arc<dyn ComputeContext> = Arc::new(HostContext::new());
        let pyramid = GpuPyramid::from_directory(
            &directory,
            ctx,
            input_kind,
            output_kind,
            dim,
            schedule,
        )
        .unwrap();
        (pyramid, txn)
    }

    #[test]
    fn test_pyramid_level_shapes() {
        let (mut pyramid, _txn) = build(
            PyramidSchedule::default_shrink(3, 3),
            PixelKind::U8,
            PixelKind::F32,
            3,
        );
        let input = Image::new(PixelKind::U8, &[16, 16, 8]).unwrap();
        pyramid.set_input(DeviceImage::graft(input)).unwrap();
        pyramid.update().unwrap();
        let levels = pyramid.take_outputs().unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].host().size(), &[4, 4, 2]);
        assert_eq!(levels[1].host().size(), &[8, 8, 4]);
        assert_eq!(levels[2].host().size(), &[16, 16, 8]);
        for level in &levels {
            assert_eq!(level.host().kind(), PixelKind::F32);
        }
    }

    #[test]
    fn test_pyramid_requires_input() {
        let (mut pyramid, _txn) = build(
            PyramidSchedule::default_for(2, 2),
            PixelKind::F32,
            PixelKind::F32,
            2,
        );
        assert!(pyramid.update().is_err());
    }

    #[test]
    fn test_pyramid_rejects_wrong_input() {
        let (mut pyramid, _txn) = build(
            PyramidSchedule::default_for(2, 2),
            PixelKind::F32,
            PixelKind::F32,
            2,
        );
        let wrong_kind = Image::new(PixelKind::U8, &[8, 8]).unwrap();
        assert!(pyramid.set_input(DeviceImage::graft(wrong_kind)).is_err());
        let wrong_dim = Image::new(PixelKind::F32, &[8, 8, 8]).unwrap();
        assert!(pyramid.set_input(DeviceImage::graft(wrong_dim)).is_err());
    }

    #[test]
    fn test_construction_fails_without_factories() {
        let directory = FactoryDirectory::new();
        let ctx: Arc<dyn ComputeContext> = Arc::new(HostContext::new());
        let err = GpuPyramid::from_directory(
            &directory,
            ctx,
            PixelKind::F32,
            PixelKind::F32,
            3,
            PyramidSchedule::default_for(2, 3),
        )
        .unwrap_err();
        assert!(matches!(err, ComputeError::FactoryMissing(_)));
    }
}
