//! The type matrix and the factory keys enumerated from it.
//!
//! Device kernels exist for a finite set of (input kind, output kind,
//! dimension) combinations. Rather than one registration call per
//! combination, the matrix is plain data and the registrar walks it: for
//! dual-arity families every declared output kind is tried against every
//! declared input kind, not only matching pairs.

use pyr_core::PixelKind;

use crate::family::{FamilyArity, FilterFamily};

/// Identity of one factory registry entry.
///
/// `input`/`output` are `None` for the arity positions a family does not
/// vary over (e.g. identity transforms key on dimension alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryKey {
    /// Filter family the entry serves.
    pub family: FilterFamily,
    /// Input pixel kind, if the family varies over it.
    pub input: Option<PixelKind>,
    /// Output pixel kind, if the family varies over it.
    pub output: Option<PixelKind>,
    /// Spatial dimension.
    pub dimension: usize,
}

impl FactoryKey {
    /// Key for a dimension-only family.
    pub fn dimension_only(family: FilterFamily, dimension: usize) -> Self {
        Self { family, input: None, output: None, dimension }
    }

    /// Key for a single-type family (input = output).
    pub fn single(family: FilterFamily, kind: PixelKind, dimension: usize) -> Self {
        Self { family, input: Some(kind), output: Some(kind), dimension }
    }

    /// Key for a dual-type family.
    pub fn dual(
        family: FilterFamily,
        input: PixelKind,
        output: PixelKind,
        dimension: usize,
    ) -> Self {
        Self { family, input: Some(input), output: Some(output), dimension }
    }
}

impl std::fmt::Display for FactoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.input, self.output) {
            (Some(i), Some(o)) if i == o => {
                write!(f, "{}<{}>/{}d", self.family, i, self.dimension)
            }
            (Some(i), Some(o)) => {
                write!(f, "{}<{}->{}>/{}d", self.family, i, o, self.dimension)
            }
            _ => write!(f, "{}/{}d", self.family, self.dimension),
        }
    }
}

/// The statically declared set of supported pixel kinds and dimensions.
#[derive(Debug, Clone)]
pub struct TypeMatrix {
    /// Pixel kinds the kernel set is compiled for.
    pub pixel_kinds: Vec<PixelKind>,
    /// Spatial dimensions the kernel set is compiled for.
    pub dimensions: Vec<usize>,
}

impl Default for TypeMatrix {
    fn default() -> Self {
        Self {
            pixel_kinds: PixelKind::ALL.to_vec(),
            dimensions: vec![1, 2, 3],
        }
    }
}

impl TypeMatrix {
    /// Matrix restricted to the given kinds, keeping the default dimensions.
    pub fn with_kinds(kinds: &[PixelKind]) -> Self {
        Self {
            pixel_kinds: kinds.to_vec(),
            ..Self::default()
        }
    }

    /// Enumerate every factory key for a family, per its arity.
    ///
    /// Dual-arity families produce the full input x output cross product for
    /// each dimension; single-arity families one key per kind; dimension-only
    /// families one key per dimension.
    pub fn keys_for(&self, family: FilterFamily) -> Vec<FactoryKey> {
        let mut keys = Vec::new();
        for &dim in &self.dimensions {
            match family.arity() {
                FamilyArity::DimensionOnly => {
                    keys.push(FactoryKey::dimension_only(family, dim));
                }
                FamilyArity::SingleType => {
                    for &kind in &self.pixel_kinds {
                        keys.push(FactoryKey::single(family, kind, dim));
                    }
                }
                FamilyArity::DualType => {
                    for &input in &self.pixel_kinds {
                        for &output in &self.pixel_kinds {
                            keys.push(FactoryKey::dual(family, input, output, dim));
                        }
                    }
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_dual_family_full_cross_product() {
        let matrix = TypeMatrix::default();
        let keys = matrix.keys_for(FilterFamily::Resample);
        // 7 inputs x 7 outputs x 3 dimensions
        assert_eq!(keys.len(), 7 * 7 * 3);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        // Non-matching pairs are present
        assert!(keys.contains(&FactoryKey::dual(
            FilterFamily::Resample,
            PixelKind::U8,
            PixelKind::F32,
            3
        )));
    }

    #[test]
    fn test_single_family_no_cross_product() {
        let matrix = TypeMatrix::default();
        let keys = matrix.keys_for(FilterFamily::LinearInterpolate);
        assert_eq!(keys.len(), 7 * 3);
        for key in &keys {
            assert_eq!(key.input, key.output);
        }
    }

    #[test]
    fn test_dimension_only_family() {
        let matrix = TypeMatrix::default();
        let keys = matrix.keys_for(FilterFamily::IdentityTransform);
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| k.input.is_none() && k.output.is_none()));
    }

    #[test]
    fn test_key_display() {
        let dual = FactoryKey::dual(FilterFamily::Cast, PixelKind::U8, PixelKind::F32, 3);
        assert_eq!(dual.to_string(), "cast<u8->f32>/3d");
        let single = FactoryKey::single(FilterFamily::ImageAllocation, PixelKind::I16, 2);
        assert_eq!(single.to_string(), "image<i16>/2d");
        let dim = FactoryKey::dimension_only(FilterFamily::IdentityTransform, 3);
        assert_eq!(dim.to_string(), "identity-transform/3d");
    }
}
