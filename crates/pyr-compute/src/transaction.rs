//! Scoped registration of factory entries.
//!
//! A transaction makes factories visible to generic construction for exactly
//! the duration of one device stage attempt. Close runs from `Drop` as well,
//! so the drain-on-every-exit-path guarantee is structural rather than coded
//! at each call site.

use std::sync::Arc;

use tracing::debug;

use crate::directory::FactoryDirectory;
use crate::factory::FactoryProvider;
use crate::family::FilterFamily;
use crate::matrix::{FactoryKey, TypeMatrix};
use crate::registrar::enumerate_factories;
use crate::ComputeResult;

/// Open register/execute/unregister bracket over a factory directory.
pub struct RegistrationTransaction {
    directory: Arc<FactoryDirectory>,
    registered: Vec<FactoryKey>,
    closed: bool,
}

impl RegistrationTransaction {
    /// Enumerate and register every factory the families need.
    ///
    /// On any failure mid-registration, entries registered so far are
    /// unwound before the error is returned; the directory is left exactly
    /// as it was found.
    pub fn open(
        directory: Arc<FactoryDirectory>,
        matrix: &TypeMatrix,
        families: &[FilterFamily],
        provider: &dyn FactoryProvider,
    ) -> ComputeResult<Self> {
        let factories = enumerate_factories(matrix, families, provider)?;
        let mut registered = Vec::with_capacity(factories.len());
        for factory in factories {
            let key = factory.key();
            if let Err(e) = directory.register(factory) {
                for key in &registered {
                    directory.unregister(key);
                }
                return Err(e);
            }
            registered.push(key);
        }
        debug!(entries = registered.len(), "registration transaction opened");
        Ok(Self { directory, registered, closed: false })
    }

    /// Number of entries this transaction holds in the directory.
    pub fn len(&self) -> usize {
        if self.closed { 0 } else { self.registered.len() }
    }

    /// Whether the transaction holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The directory this transaction registered into.
    pub fn directory(&self) -> &Arc<FactoryDirectory> {
        &self.directory
    }

    /// Remove every entry this transaction registered.
    ///
    /// Idempotent: a second close is a no-op and never touches entries of a
    /// later transaction.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for key in &self.registered {
            self.directory.unregister(key);
        }
        debug!(entries = self.registered.len(), "registration transaction closed");
        self.closed = true;
    }
}

impl Drop for RegistrationTransaction {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PYRAMID_FAMILIES;
    use crate::host::HostProvider;

    fn open_full(directory: &Arc<FactoryDirectory>) -> RegistrationTransaction {
        RegistrationTransaction::open(
            directory.clone(),
            &TypeMatrix::default(),
            &PYRAMID_FAMILIES,
            &HostProvider::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_open_close_drains() {
        let directory = Arc::new(FactoryDirectory::new());
        let mut txn = open_full(&directory);
        assert_eq!(directory.len(), txn.len());
        assert!(!txn.is_empty());
        txn.close();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_drop_drains() {
        let directory = Arc::new(FactoryDirectory::new());
        {
            let _txn = open_full(&directory);
            assert!(!directory.is_empty());
        }
        assert!(directory.is_empty());
    }

    #[test]
    fn test_close_idempotent() {
        let directory = Arc::new(FactoryDirectory::new());
        let mut first = open_full(&directory);
        first.close();
        // A later transaction's entries must survive a stale second close.
        let second = open_full(&directory);
        let live = directory.len();
        first.close();
        assert_eq!(directory.len(), live);
        drop(second);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_open_unwinds_on_conflict() {
        let directory = Arc::new(FactoryDirectory::new());
        let txn = open_full(&directory);
        let live = directory.len();
        // Same (key, family) set is already live: open must fail and leave
        // the directory exactly as it found it.
        let err = RegistrationTransaction::open(
            directory.clone(),
            &TypeMatrix::default(),
            &PYRAMID_FAMILIES,
            &HostProvider::new(),
        );
        assert!(err.is_err());
        assert_eq!(directory.len(), live);
        drop(txn);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_sequential_transactions() {
        let directory = Arc::new(FactoryDirectory::new());
        for _ in 0..3 {
            let txn = open_full(&directory);
            assert_eq!(directory.len(), txn.len());
            drop(txn);
            assert!(directory.is_empty());
        }
    }
}
