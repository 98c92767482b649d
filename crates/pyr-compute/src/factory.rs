//! Factory traits for device-specialized filters.

use std::sync::Arc;

use crate::context::ComputeContext;
use crate::directory::FactoryDirectory;
use crate::filter::DeviceFilter;
use crate::matrix::FactoryKey;
use crate::ComputeResult;

/// One factory registry entry: produces device filter instances for exactly
/// one key.
///
/// Entries are created when a registration transaction opens and live only
/// until it closes; they are never retained beyond the owning transaction.
pub trait FilterFactory: Send + Sync {
    /// The key this factory serves.
    fn key(&self) -> FactoryKey;

    /// Produce one filter instance.
    ///
    /// `directory` is the registry the factory itself was resolved from, so
    /// composite filters (resample) can pull their collaborators (transform,
    /// interpolator) through the same generic construction mechanism.
    fn create(
        &self,
        ctx: &Arc<dyn ComputeContext>,
        directory: &FactoryDirectory,
    ) -> ComputeResult<Box<dyn DeviceFilter>>;
}

impl std::fmt::Debug for dyn FilterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFactory")
            .field("key", &self.key())
            .finish_non_exhaustive()
    }
}

/// Source of factories for a kernel set.
///
/// The registrar asks the provider for each key the type matrix enumerates.
pub trait FactoryProvider: Send + Sync {
    /// Factory for a key, if the kernel set supports it.
    ///
    /// `Ok(None)` means the combination has no compiled kernel: the key is
    /// skipped silently (absence from the registry, not a fault). `Err` is a
    /// registry inconsistency and aborts the whole enumeration.
    fn factory_for(&self, key: &FactoryKey) -> ComputeResult<Option<Arc<dyn FilterFactory>>>;
}
