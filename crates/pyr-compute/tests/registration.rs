//! Registration coverage over the full type matrix.

use std::sync::Arc;

use pyr_compute::host::HostProvider;
use pyr_compute::{
    FactoryDirectory, FactoryKey, FamilyArity, RegistrationTransaction, TypeMatrix,
    PYRAMID_FAMILIES,
};
use pyr_core::PixelKind;

#[test]
fn test_every_combination_gets_exactly_one_entry() {
    let matrix = TypeMatrix::default();
    let directory = Arc::new(FactoryDirectory::new());
    let txn = RegistrationTransaction::open(
        directory.clone(),
        &matrix,
        &PYRAMID_FAMILIES,
        &HostProvider::new(),
    )
    .unwrap();

    let mut expected = 0usize;
    for family in PYRAMID_FAMILIES {
        for key in matrix.keys_for(family) {
            assert!(directory.contains(&key), "missing entry for {key}");
            expected += 1;
        }
    }
    assert_eq!(directory.len(), expected);
    assert_eq!(txn.len(), expected);
}

#[test]
fn test_restricted_matrix_registers_subset() {
    let full = {
        let directory = Arc::new(FactoryDirectory::new());
        let _txn = RegistrationTransaction::open(
            directory.clone(),
            &TypeMatrix::default(),
            &PYRAMID_FAMILIES,
            &HostProvider::new(),
        )
        .unwrap();
        directory.len()
    };

    let matrix = TypeMatrix::with_kinds(&[PixelKind::U8, PixelKind::F32]);
    let directory = Arc::new(FactoryDirectory::new());
    let _txn = RegistrationTransaction::open(
        directory.clone(),
        &matrix,
        &PYRAMID_FAMILIES,
        &HostProvider::new(),
    )
    .unwrap();

    assert!(directory.len() < full);
    // Dual-type entries stay within the restricted kinds.
    for key in directory.keys() {
        for kind in key.input.iter().chain(key.output.iter()) {
            assert!(matches!(kind, PixelKind::U8 | PixelKind::F32));
        }
    }
}

#[test]
fn test_partial_provider_skips_unsupported_kinds() {
    // A provider with only float kernels contributes no integer entries,
    // and skipping is not an error.
    let directory = Arc::new(FactoryDirectory::new());
    let _txn = RegistrationTransaction::open(
        directory.clone(),
        &TypeMatrix::default(),
        &PYRAMID_FAMILIES,
        &HostProvider::with_kinds(&[PixelKind::F32]),
    )
    .unwrap();

    for key in directory.keys() {
        assert!(key.input.is_none_or(|k| k == PixelKind::F32));
        assert!(key.output.is_none_or(|k| k == PixelKind::F32));
    }
    // Dimension-only families are kind-independent and always present.
    let dim_only = PYRAMID_FAMILIES
        .iter()
        .filter(|f| f.arity() == FamilyArity::DimensionOnly)
        .count();
    assert!(directory.len() >= dim_only);
}

#[test]
fn test_close_removes_exactly_the_registered_entries() {
    let directory = Arc::new(FactoryDirectory::new());
    let narrow = TypeMatrix::with_kinds(&[PixelKind::F32]);
    let mut outer = RegistrationTransaction::open(
        directory.clone(),
        &narrow,
        &PYRAMID_FAMILIES,
        &HostProvider::new(),
    )
    .unwrap();
    let outer_keys: Vec<FactoryKey> = directory.keys();

    outer.close();
    assert!(directory.is_empty());
    for key in &outer_keys {
        assert!(!directory.contains(key));
    }
}
