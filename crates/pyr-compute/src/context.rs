//! Compute context abstraction and device-managed images.
//!
//! Context creation and teardown live outside this crate; a stage only ever
//! asks whether a context exists ([`ComputeContext::is_created`] - the
//! capability probe) and hands it work. Probing is pure: a stage with no
//! context falls back, it never creates one as a side effect.

use pyr_core::{Image, PixelKind};

use crate::{ComputeError, ComputeResult};

/// Handle to an externally managed compute device.
pub trait ComputeContext: Send + Sync {
    /// Whether a usable device context has been created process-wide.
    ///
    /// Pure query; safe to call repeatedly and from multiple stages.
    fn is_created(&self) -> bool;

    /// Device name for diagnostics.
    fn device_name(&self) -> &str;

    /// Reserve device storage for an image of the given shape.
    fn allocate(&self, kind: PixelKind, size: &[usize]) -> ComputeResult<()>;

    /// Transfer host samples to the device copy.
    fn upload(&self, image: &Image) -> ComputeResult<()>;
}

/// A host image grafted into device buffer management.
///
/// Mirrors the usual device data-manager discipline: the host buffer can be
/// locked against mutation while the device copy is authoritative, and
/// uploads happen only when the device copy has been marked dirty.
#[derive(Debug)]
pub struct DeviceImage {
    host: Image,
    device_allocated: bool,
    device_dirty: bool,
    host_locked: bool,
}

impl DeviceImage {
    /// Graft an existing host image without copying its samples.
    pub fn graft(host: Image) -> Self {
        Self {
            host,
            device_allocated: false,
            device_dirty: false,
            host_locked: false,
        }
    }

    /// Reserve the device-side buffer.
    pub fn allocate_device(&mut self, ctx: &dyn ComputeContext) -> ComputeResult<()> {
        if !ctx.is_created() {
            return Err(ComputeError::ContextNotCreated);
        }
        ctx.allocate(self.host.kind(), self.host.size())?;
        self.device_allocated = true;
        Ok(())
    }

    /// Lock or unlock the host buffer while the device copy is in use.
    pub fn set_host_lock(&mut self, locked: bool) {
        self.host_locked = locked;
    }

    /// Mark the device copy stale so the next update forces an upload.
    pub fn mark_device_dirty(&mut self) {
        self.device_dirty = true;
    }

    /// Upload host samples if the device copy is stale.
    pub fn update_device_buffer(&mut self, ctx: &dyn ComputeContext) -> ComputeResult<()> {
        if !self.device_allocated {
            return Err(ComputeError::UploadFailed(
                "device buffer not allocated".into(),
            ));
        }
        if self.device_dirty {
            ctx.upload(&self.host)?;
            self.device_dirty = false;
        }
        Ok(())
    }

    /// Whether the device-side buffer has been reserved.
    pub fn device_allocated(&self) -> bool {
        self.device_allocated
    }

    /// Whether the host buffer is locked.
    pub fn host_locked(&self) -> bool {
        self.host_locked
    }

    /// Host view of the samples.
    pub fn host(&self) -> &Image {
        &self.host
    }

    /// Mutable host view; fails while the host buffer is locked.
    pub fn host_mut(&mut self) -> ComputeResult<&mut Image> {
        if self.host_locked {
            return Err(ComputeError::InvalidInput(
                "host buffer is locked".into(),
            ));
        }
        Ok(&mut self.host)
    }

    /// Take the computed buffer without copying (the zero-copy hand-off).
    pub fn into_host(self) -> Image {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostContext;

    #[test]
    fn test_graft_and_hand_off() {
        let img = Image::from_vec(PixelKind::F32, &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let dev = DeviceImage::graft(img);
        let back = dev.into_host();
        assert_eq!(back.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_update_requires_allocation() {
        let ctx = HostContext::new();
        let mut dev = DeviceImage::graft(Image::new(PixelKind::F32, &[2]).unwrap());
        dev.mark_device_dirty();
        assert!(dev.update_device_buffer(&ctx).is_err());
        dev.allocate_device(&ctx).unwrap();
        assert!(dev.update_device_buffer(&ctx).is_ok());
    }

    #[test]
    fn test_host_lock_blocks_mutation() {
        let mut dev = DeviceImage::graft(Image::new(PixelKind::F32, &[2]).unwrap());
        dev.set_host_lock(true);
        assert!(dev.host_mut().is_err());
        dev.set_host_lock(false);
        assert!(dev.host_mut().is_ok());
    }
}
