//! Device filter families a pyramid stage registers factories for.

/// Filter families with device-specialized variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterFamily {
    /// Device image allocation.
    ImageAllocation,
    /// Recursive gaussian smoothing.
    RecursiveGaussian,
    /// Pixel kind cast.
    Cast,
    /// Integer-factor shrink.
    Shrink,
    /// Resample to an arbitrary output grid.
    Resample,
    /// Identity spatial transform.
    IdentityTransform,
    /// Linear interpolation image function.
    LinearInterpolate,
}

/// How a family's factory keys are enumerated from the type matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArity {
    /// Keys vary over dimension only (spatial transforms).
    DimensionOnly,
    /// Keys vary over one pixel kind and dimension (input = output).
    SingleType,
    /// Keys vary over the full input x output pixel kind cross product.
    DualType,
}

impl FilterFamily {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImageAllocation => "image",
            Self::RecursiveGaussian => "recursive-gaussian",
            Self::Cast => "cast",
            Self::Shrink => "shrink",
            Self::Resample => "resample",
            Self::IdentityTransform => "identity-transform",
            Self::LinearInterpolate => "linear-interpolate",
        }
    }

    /// Key enumeration arity for this family.
    pub fn arity(&self) -> FamilyArity {
        match self {
            Self::IdentityTransform => FamilyArity::DimensionOnly,
            Self::ImageAllocation | Self::LinearInterpolate => FamilyArity::SingleType,
            Self::RecursiveGaussian | Self::Cast | Self::Shrink | Self::Resample => {
                FamilyArity::DualType
            }
        }
    }
}

impl std::fmt::Display for FilterFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The family set one pyramid stage registers for its transaction.
pub const PYRAMID_FAMILIES: [FilterFamily; 7] = [
    FilterFamily::ImageAllocation,
    FilterFamily::RecursiveGaussian,
    FilterFamily::Cast,
    FilterFamily::Shrink,
    FilterFamily::Resample,
    FilterFamily::IdentityTransform,
    FilterFamily::LinearInterpolate,
];
