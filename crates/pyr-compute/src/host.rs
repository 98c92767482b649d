//! Host emulation of a device kernel set.
//!
//! Runs every filter family on the CPU (rayon) behind the same traits a real
//! device plugs in through. Used by environments without a vendor kernel set
//! and by the end-to-end tests. Construction goes through the factory
//! directory exactly as a device implementation would: output containers come
//! from the image-allocation factory, and the resample factory resolves its
//! transform and interpolator from the directory at creation time.

use std::sync::Arc;

use pyr_core::{Image, PixelKind};

use crate::context::{ComputeContext, DeviceImage};
use crate::directory::FactoryDirectory;
use crate::factory::{FactoryProvider, FilterFactory};
use crate::family::FilterFamily;
use crate::filter::{DeviceFilter, FilterParams};
use crate::kernels;
use crate::matrix::FactoryKey;
use crate::{ComputeError, ComputeResult};

/// A compute context that is always created and whose transfers are no-ops.
#[derive(Debug, Default)]
pub struct HostContext;

impl HostContext {
    /// Create the host context.
    pub fn new() -> Self {
        Self
    }
}

impl ComputeContext for HostContext {
    fn is_created(&self) -> bool {
        true
    }

    fn device_name(&self) -> &str {
        "host"
    }

    fn allocate(&self, _kind: PixelKind, _size: &[usize]) -> ComputeResult<()> {
        Ok(())
    }

    fn upload(&self, _image: &Image) -> ComputeResult<()> {
        Ok(())
    }
}

/// Factory provider for the host kernel set.
pub struct HostProvider {
    kinds: Vec<PixelKind>,
}

impl HostProvider {
    /// Provider supporting every pixel kind.
    pub fn new() -> Self {
        Self { kinds: PixelKind::ALL.to_vec() }
    }

    /// Provider supporting only the given kinds, as a partially compiled
    /// kernel set would.
    pub fn with_kinds(kinds: &[PixelKind]) -> Self {
        Self { kinds: kinds.to_vec() }
    }
}

impl Default for HostProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryProvider for HostProvider {
    fn factory_for(&self, key: &FactoryKey) -> ComputeResult<Option<Arc<dyn FilterFactory>>> {
        let supported = key.input.is_none_or(|k| self.kinds.contains(&k))
            && key.output.is_none_or(|k| self.kinds.contains(&k));
        if !supported {
            return Ok(None);
        }
        Ok(Some(Arc::new(HostFactory { key: *key })))
    }
}

struct HostFactory {
    key: FactoryKey,
}

impl FilterFactory for HostFactory {
    fn key(&self) -> FactoryKey {
        self.key
    }

    fn create(
        &self,
        ctx: &Arc<dyn ComputeContext>,
        directory: &FactoryDirectory,
    ) -> ComputeResult<Box<dyn DeviceFilter>> {
        let key = self.key;
        match key.family {
            FilterFamily::ImageAllocation => Ok(Box::new(HostAlloc { key })),
            FilterFamily::IdentityTransform => Ok(Box::new(HostIdentityTransform { key })),
            FilterFamily::Cast => Ok(Box::new(HostCast {
                key,
                alloc: resolve_alloc(directory, ctx, key.output, key.dimension)?,
            })),
            FilterFamily::RecursiveGaussian => Ok(Box::new(HostGaussian {
                key,
                alloc: resolve_alloc(directory, ctx, key.output, key.dimension)?,
            })),
            FilterFamily::Shrink => Ok(Box::new(HostShrink {
                key,
                alloc: resolve_alloc(directory, ctx, key.output, key.dimension)?,
            })),
            FilterFamily::LinearInterpolate => Ok(Box::new(HostLinearInterpolate {
                key,
                alloc: resolve_alloc(directory, ctx, key.input, key.dimension)?,
            })),
            FilterFamily::Resample => {
                // A resample filter pulls its collaborators through the same
                // generic construction mechanism it was created by.
                let input = key.input.ok_or_else(|| {
                    ComputeError::InvalidInput(format!("{key} has no input kind"))
                })?;
                let transform = directory.create_filter(
                    &FactoryKey::dimension_only(FilterFamily::IdentityTransform, key.dimension),
                    ctx,
                )?;
                let interpolator = directory.create_filter(
                    &FactoryKey::single(FilterFamily::LinearInterpolate, input, key.dimension),
                    ctx,
                )?;
                Ok(Box::new(HostResample { key, transform, interpolator }))
            }
        }
    }
}

fn resolve_alloc(
    directory: &FactoryDirectory,
    ctx: &Arc<dyn ComputeContext>,
    kind: Option<PixelKind>,
    dimension: usize,
) -> ComputeResult<Box<dyn DeviceFilter>> {
    let kind = kind
        .ok_or_else(|| ComputeError::InvalidInput("allocation needs a pixel kind".into()))?;
    directory.create_filter(
        &FactoryKey::single(FilterFamily::ImageAllocation, kind, dimension),
        ctx,
    )
}

/// Allocate an output container via the allocation filter.
fn alloc_container(
    alloc: &mut Box<dyn DeviceFilter>,
    ctx: &Arc<dyn ComputeContext>,
    input: &DeviceImage,
    size: &[usize],
    kind: PixelKind,
) -> ComputeResult<DeviceImage> {
    let params = FilterParams {
        output_size: size.to_vec(),
        output_kind: Some(kind),
        ..Default::default()
    };
    alloc.apply(ctx, input, &params)
}

// ============================================================================
// Filter instances
// ============================================================================

struct HostAlloc {
    key: FactoryKey,
}

impl DeviceFilter for HostAlloc {
    fn family(&self) -> FilterFamily {
        FilterFamily::ImageAllocation
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        let size = if params.output_size.is_empty() {
            input.host().size().to_vec()
        } else {
            params.output_size.clone()
        };
        let kind = params
            .output_kind
            .or(self.key.output)
            .unwrap_or_else(|| input.host().kind());
        let mut out = DeviceImage::graft(Image::new(kind, &size)?);
        out.allocate_device(ctx.as_ref())?;
        Ok(out)
    }
}

struct HostIdentityTransform {
    #[allow(dead_code)]
    key: FactoryKey,
}

impl DeviceFilter for HostIdentityTransform {
    fn family(&self) -> FilterFamily {
        FilterFamily::IdentityTransform
    }

    fn apply(
        &mut self,
        _ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        _params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        // Identity mapping leaves the grid untouched.
        Ok(DeviceImage::graft(input.host().clone()))
    }
}

struct HostCast {
    key: FactoryKey,
    alloc: Box<dyn DeviceFilter>,
}

impl DeviceFilter for HostCast {
    fn family(&self) -> FilterFamily {
        FilterFamily::Cast
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        let kind = params.output_kind.or(self.key.output).ok_or_else(|| {
            ComputeError::InvalidInput("cast needs an output kind".into())
        })?;
        let mut out =
            alloc_container(&mut self.alloc, ctx, input, input.host().size(), kind)?;
        kernels::cast_into(input.host(), out.host_mut()?)?;
        Ok(out)
    }
}

struct HostGaussian {
    key: FactoryKey,
    alloc: Box<dyn DeviceFilter>,
}

impl DeviceFilter for HostGaussian {
    fn family(&self) -> FilterFamily {
        FilterFamily::RecursiveGaussian
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        let kind = self.key.output.unwrap_or_else(|| input.host().kind());
        let mut out =
            alloc_container(&mut self.alloc, ctx, input, input.host().size(), kind)?;
        kernels::smooth_into(input.host(), &params.sigmas, out.host_mut()?)?;
        Ok(out)
    }
}

struct HostShrink {
    key: FactoryKey,
    alloc: Box<dyn DeviceFilter>,
}

impl DeviceFilter for HostShrink {
    fn family(&self) -> FilterFamily {
        FilterFamily::Shrink
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        let kind = self.key.output.unwrap_or_else(|| input.host().kind());
        let size = kernels::shrunk_size(input.host().size(), &params.shrink_factors);
        let mut out = alloc_container(&mut self.alloc, ctx, input, &size, kind)?;
        kernels::shrink_into(input.host(), &params.shrink_factors, out.host_mut()?)?;
        Ok(out)
    }
}

struct HostLinearInterpolate {
    key: FactoryKey,
    alloc: Box<dyn DeviceFilter>,
}

impl DeviceFilter for HostLinearInterpolate {
    fn family(&self) -> FilterFamily {
        FilterFamily::LinearInterpolate
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        if params.output_size.is_empty() {
            return Err(ComputeError::InvalidInput(
                "interpolation needs an output size".into(),
            ));
        }
        let kind = self.key.input.unwrap_or_else(|| input.host().kind());
        let mut out =
            alloc_container(&mut self.alloc, ctx, input, &params.output_size, kind)?;
        kernels::resample_into(input.host(), out.host_mut()?)?;
        Ok(out)
    }
}

struct HostResample {
    #[allow(dead_code)]
    key: FactoryKey,
    transform: Box<dyn DeviceFilter>,
    interpolator: Box<dyn DeviceFilter>,
}

impl DeviceFilter for HostResample {
    fn family(&self) -> FilterFamily {
        FilterFamily::Resample
    }

    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage> {
        let moved = self.transform.apply(ctx, input, params)?;
        self.interpolator.apply(ctx, &moved, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PYRAMID_FAMILIES;
    use crate::matrix::TypeMatrix;
    use crate::transaction::RegistrationTransaction;

    fn with_open_directory() -> (Arc<FactoryDirectory>, RegistrationTransaction) {
        let directory = Arc::new(FactoryDirectory::new());
        let txn = RegistrationTransaction::open(
            directory.clone(),
            &TypeMatrix::default(),
            &PYRAMID_FAMILIES,
            &HostProvider::new(),
        )
        .unwrap();
        (directory, txn)
    }

    #[test]
    fn test_cast_filter_via_directory() {
        let (directory, _txn) = with_open_directory();
        let ctx: Arc<dyn ComputeContext> = Arc::new(HostContext::new());
        let key = FactoryKey::dual(FilterFamily::Cast, PixelKind::F32, PixelKind::U8, 1);
        let mut cast = directory.create_filter(&key, &ctx).unwrap();

        let input = DeviceImage::graft(
            Image::from_vec(PixelKind::F32, &[3], vec![1.4, 2.6, -7.0]).unwrap(),
        );
        let params = FilterParams {
            output_kind: Some(PixelKind::U8),
            ..Default::default()
        };
        let out = cast.apply(&ctx, &input, &params).unwrap();
        assert_eq!(out.host().kind(), PixelKind::U8);
        assert_eq!(out.host().data(), &[1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_resample_factory_pulls_collaborators() {
        // Without the interpolator factory registered, creating a resample
        // filter must fail with a missing-factory error.
        let directory = Arc::new(FactoryDirectory::new());
        let ctx: Arc<dyn ComputeContext> = Arc::new(HostContext::new());
        let provider = HostProvider::new();
        let key = FactoryKey::dual(FilterFamily::Resample, PixelKind::F32, PixelKind::F32, 2);
        directory
            .register(provider.factory_for(&key).unwrap().unwrap())
            .unwrap();
        let err = directory.create_filter(&key, &ctx).unwrap_err();
        assert!(matches!(err, ComputeError::FactoryMissing(_)));
    }

    #[test]
    fn test_shrink_filter_output_shape() {
        let (directory, _txn) = with_open_directory();
        let ctx: Arc<dyn ComputeContext> = Arc::new(HostContext::new());
        let key = FactoryKey::dual(FilterFamily::Shrink, PixelKind::F32, PixelKind::F32, 2);
        let mut shrink = directory.create_filter(&key, &ctx).unwrap();

        let input = DeviceImage::graft(Image::new(PixelKind::F32, &[8, 6]).unwrap());
        let params = FilterParams {
            shrink_factors: vec![2, 3],
            ..Default::default()
        };
        let out = shrink.apply(&ctx, &input, &params).unwrap();
        assert_eq!(out.host().size(), &[4, 2]);
        assert_eq!(out.host().spacing(), &[2.0, 3.0]);
    }
}
