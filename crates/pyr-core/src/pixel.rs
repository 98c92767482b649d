//! Logical pixel kinds for device-specialized filters.
//!
//! Device kernels are compiled for a fixed set of scalar pixel types. The
//! dispatch layer enumerates that set at runtime, so the kinds are plain data
//! rather than type parameters. Sample storage is always f32; a kind records
//! the *logical* type, which governs cast semantics (rounding and clamping)
//! and factory lookup.

/// Scalar pixel types the device kernel set is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PixelKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit float.
    F32,
}

impl PixelKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [PixelKind; 7] = [
        PixelKind::U8,
        PixelKind::I8,
        PixelKind::U16,
        PixelKind::I16,
        PixelKind::U32,
        PixelKind::I32,
        PixelKind::F32,
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
        }
    }

    /// Size of one sample in device memory, in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    /// Whether this is an integer kind.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::F32)
    }

    /// Representable value range as f32 endpoints.
    ///
    /// For `F32` the range is unbounded (infinite endpoints).
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::U8 => (0.0, u8::MAX as f32),
            Self::I8 => (i8::MIN as f32, i8::MAX as f32),
            Self::U16 => (0.0, u16::MAX as f32),
            Self::I16 => (i16::MIN as f32, i16::MAX as f32),
            Self::U32 => (0.0, u32::MAX as f32),
            Self::I32 => (i32::MIN as f32, i32::MAX as f32),
            Self::F32 => (f32::NEG_INFINITY, f32::INFINITY),
        }
    }

    /// Convert a working-precision sample to this kind's value semantics.
    ///
    /// Integer kinds round to nearest and clamp to the representable range;
    /// `F32` passes through unchanged.
    pub fn quantize(&self, value: f32) -> f32 {
        if *self == Self::F32 {
            return value;
        }
        let (lo, hi) = self.range();
        value.round().clamp(lo, hi)
    }
}

impl std::fmt::Display for PixelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
