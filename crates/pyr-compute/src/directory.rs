//! The factory directory: a keyed registry of live factory entries.
//!
//! Conceptually process-wide, but injected as `Arc<FactoryDirectory>` so
//! ownership and teardown stay explicit. Access is serialized through the
//! transaction discipline: at most one open transaction touches a given
//! (family, type) set at a time, so the internal mutex only guards against
//! torn reads, not concurrent transactions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::context::ComputeContext;
use crate::factory::FilterFactory;
use crate::filter::DeviceFilter;
use crate::matrix::FactoryKey;
use crate::{ComputeError, ComputeResult};

/// Registry mapping factory keys to live entries.
#[derive(Default)]
pub struct FactoryDirectory {
    entries: Mutex<HashMap<FactoryKey, Arc<dyn FilterFactory>>>,
}

impl FactoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Two live entries for the same key are an error.
    pub fn register(&self, factory: Arc<dyn FilterFactory>) -> ComputeResult<()> {
        let key = factory.key();
        let mut entries = self.entries.lock().expect("directory mutex poisoned");
        if entries.contains_key(&key) {
            return Err(ComputeError::DuplicateFactory(key));
        }
        entries.insert(key, factory);
        Ok(())
    }

    /// Remove an entry. Returns `true` if it was present.
    pub fn unregister(&self, key: &FactoryKey) -> bool {
        self.entries
            .lock()
            .expect("directory mutex poisoned")
            .remove(key)
            .is_some()
    }

    /// Whether an entry exists for the key.
    pub fn contains(&self, key: &FactoryKey) -> bool {
        self.entries
            .lock()
            .expect("directory mutex poisoned")
            .contains_key(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("directory mutex poisoned").len()
    }

    /// Whether the directory holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all live keys.
    pub fn keys(&self) -> Vec<FactoryKey> {
        self.entries
            .lock()
            .expect("directory mutex poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Generic construction: look up the key and produce a filter instance.
    pub fn create_filter(
        &self,
        key: &FactoryKey,
        ctx: &Arc<dyn ComputeContext>,
    ) -> ComputeResult<Box<dyn DeviceFilter>> {
        let factory = {
            let entries = self.entries.lock().expect("directory mutex poisoned");
            entries
                .get(key)
                .cloned()
                .ok_or(ComputeError::FactoryMissing(*key))?
        };
        // The lock is released before create() so a factory may itself
        // resolve collaborators through this directory.
        factory.create(ctx, self)
    }
}

impl std::fmt::Debug for FactoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryDirectory")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::FilterFamily;
    use crate::host::HostProvider;
    use crate::factory::FactoryProvider;
    use pyr_core::PixelKind;

    fn host_factory(key: FactoryKey) -> Arc<dyn FilterFactory> {
        HostProvider::new()
            .factory_for(&key)
            .unwrap()
            .expect("host provider supports the full matrix")
    }

    #[test]
    fn test_register_and_unregister() {
        let dir = FactoryDirectory::new();
        let key = FactoryKey::single(FilterFamily::ImageAllocation, PixelKind::F32, 3);
        dir.register(host_factory(key)).unwrap();
        assert!(dir.contains(&key));
        assert_eq!(dir.len(), 1);
        assert!(dir.unregister(&key));
        assert!(dir.is_empty());
        assert!(!dir.unregister(&key));
    }

    #[test]
    fn test_duplicate_rejected() {
        let dir = FactoryDirectory::new();
        let key = FactoryKey::dual(FilterFamily::Cast, PixelKind::U8, PixelKind::F32, 2);
        dir.register(host_factory(key)).unwrap();
        let err = dir.register(host_factory(key)).unwrap_err();
        assert!(matches!(err, ComputeError::DuplicateFactory(_)));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_create_filter_missing() {
        let dir = FactoryDirectory::new();
        let ctx: Arc<dyn ComputeContext> = Arc::new(crate::host::HostContext::new());
        let key = FactoryKey::dimension_only(FilterFamily::IdentityTransform, 3);
        let err = dir.create_filter(&key, &ctx).unwrap_err();
        assert!(matches!(err, ComputeError::FactoryMissing(_)));
    }
}
