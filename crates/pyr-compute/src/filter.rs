//! Device filter instances produced via factories.

use std::sync::Arc;

use pyr_core::PixelKind;

use crate::context::{ComputeContext, DeviceImage};
use crate::family::FilterFamily;
use crate::ComputeResult;

/// Parameter bag for one filter application.
///
/// Only the fields a family reads are meaningful; the rest stay at their
/// defaults. Keeps the [`DeviceFilter`] trait uniform across families.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    /// Per-axis gaussian sigmas, in pixel units (smoothing).
    pub sigmas: Vec<f64>,
    /// Per-axis integer shrink factors (shrink).
    pub shrink_factors: Vec<u32>,
    /// Output extents (resample, allocation).
    pub output_size: Vec<usize>,
    /// Output pixel kind (cast, allocation).
    pub output_kind: Option<PixelKind>,
}

/// A device-specialized filter instance.
///
/// Execution is synchronous: `apply` dispatches to the device and blocks
/// until the output buffer is complete.
pub trait DeviceFilter: Send {
    /// Family this instance belongs to.
    fn family(&self) -> FilterFamily;

    /// Run the filter on a device-resident input, producing a device-resident
    /// output.
    fn apply(
        &mut self,
        ctx: &Arc<dyn ComputeContext>,
        input: &DeviceImage,
        params: &FilterParams,
    ) -> ComputeResult<DeviceImage>;
}

impl std::fmt::Debug for dyn DeviceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFilter")
            .field("family", &self.family())
            .finish_non_exhaustive()
    }
}
