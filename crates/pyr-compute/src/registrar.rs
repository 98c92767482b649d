//! Combinatorial enumeration of factory entries.

use std::sync::Arc;

use tracing::debug;

use crate::factory::{FactoryProvider, FilterFactory};
use crate::family::FilterFamily;
use crate::matrix::TypeMatrix;
use crate::ComputeResult;

/// Produce one factory per supported key per family.
///
/// Keys the provider has no kernel for are skipped without error; a provider
/// error means the type matrix itself is inconsistent with the kernel set and
/// aborts the enumeration (the fatal configuration tier).
pub fn enumerate_factories(
    matrix: &TypeMatrix,
    families: &[FilterFamily],
    provider: &dyn FactoryProvider,
) -> ComputeResult<Vec<Arc<dyn FilterFactory>>> {
    let mut factories = Vec::new();
    for &family in families {
        let mut supported = 0usize;
        let keys = matrix.keys_for(family);
        let declared = keys.len();
        for key in keys {
            if let Some(factory) = provider.factory_for(&key)? {
                debug_assert_eq!(factory.key(), key);
                factories.push(factory);
                supported += 1;
            }
        }
        debug!(family = %family, supported, declared, "enumerated factories");
    }
    Ok(factories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PYRAMID_FAMILIES;
    use crate::host::HostProvider;
    use crate::matrix::FactoryKey;
    use crate::{ComputeError, ComputeResult};
    use pyr_core::PixelKind;
    use std::collections::HashSet;

    #[test]
    fn test_full_matrix_counts() {
        let matrix = TypeMatrix::default();
        let provider = HostProvider::new();
        let factories =
            enumerate_factories(&matrix, &PYRAMID_FAMILIES, &provider).unwrap();
        // 4 dual families (7*7*3 each) + 2 single (7*3 each) + 1 dim-only (3)
        assert_eq!(factories.len(), 4 * 7 * 7 * 3 + 2 * 7 * 3 + 3);
        let keys: HashSet<_> = factories.iter().map(|f| f.key()).collect();
        assert_eq!(keys.len(), factories.len(), "no duplicate keys");
    }

    #[test]
    fn test_unsupported_keys_skipped() {
        let matrix = TypeMatrix::default();
        // Provider compiled only for f32 kernels
        let provider = HostProvider::with_kinds(&[PixelKind::F32]);
        let factories =
            enumerate_factories(&matrix, &PYRAMID_FAMILIES, &provider).unwrap();
        // Dual families collapse to 1x1 per dimension
        assert_eq!(factories.len(), 4 * 3 + 2 * 3 + 3);
        for factory in &factories {
            let key = factory.key();
            assert!(key.input.is_none() || key.input == Some(PixelKind::F32));
            assert!(key.output.is_none() || key.output == Some(PixelKind::F32));
        }
    }

    struct BrokenProvider;

    impl FactoryProvider for BrokenProvider {
        fn factory_for(
            &self,
            key: &FactoryKey,
        ) -> ComputeResult<Option<Arc<dyn FilterFactory>>> {
            Err(ComputeError::RegistryInconsistency(format!(
                "no kernel table for {key}"
            )))
        }
    }

    #[test]
    fn test_provider_error_is_fatal() {
        let matrix = TypeMatrix::default();
        let err = enumerate_factories(&matrix, &PYRAMID_FAMILIES, &BrokenProvider)
            .unwrap_err();
        assert!(matches!(err, ComputeError::RegistryInconsistency(_)));
    }
}
