//! n-dimensional image buffer.
//!
//! Samples are stored in working precision (f32) regardless of the logical
//! [`PixelKind`]; the kind governs factory dispatch and cast semantics.
//! Layout is row-major with axis 0 fastest (x, then y, then z).

use crate::error::{Error, Result};
use crate::pixel::PixelKind;

/// Image buffer for 1-3 spatial dimensions.
#[derive(Clone)]
pub struct Image {
    kind: PixelKind,
    size: Vec<usize>,
    spacing: Vec<f64>,
    data: Vec<f32>,
}

impl Image {
    /// Create a zero-filled image.
    pub fn new(kind: PixelKind, size: &[usize]) -> Result<Self> {
        let len = checked_len(size)?;
        Ok(Self {
            kind,
            size: size.to_vec(),
            spacing: vec![1.0; size.len()],
            data: vec![0.0; len],
        })
    }

    /// Create from existing sample data.
    pub fn from_vec(kind: PixelKind, size: &[usize], data: Vec<f32>) -> Result<Self> {
        let len = checked_len(size)?;
        if data.len() != len {
            return Err(Error::BufferSizeMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self {
            kind,
            size: size.to_vec(),
            spacing: vec![1.0; size.len()],
            data,
        })
    }

    /// Replace the per-axis physical spacing.
    pub fn set_spacing(&mut self, spacing: &[f64]) -> Result<()> {
        if spacing.len() != self.size.len() {
            return Err(Error::SpacingMismatch {
                spacing: spacing.len(),
                dimension: self.size.len(),
            });
        }
        self.spacing = spacing.to_vec();
        Ok(())
    }

    /// Logical pixel kind.
    pub fn kind(&self) -> PixelKind {
        self.kind
    }

    /// Retag the logical pixel kind without touching samples.
    pub fn set_kind(&mut self, kind: PixelKind) {
        self.kind = kind;
    }

    /// Spatial dimension (1-3).
    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    /// Per-axis extents.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Per-axis physical spacing.
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable sample data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the image, returning the sample buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Row-major strides (axis 0 fastest).
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.size.len()];
        for axis in 1..self.size.len() {
            strides[axis] = strides[axis - 1] * self.size[axis - 1];
        }
        strides
    }

    /// Flat offset of a coordinate.
    pub fn offset(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.size.len());
        let strides = self.strides();
        coords.iter().zip(&strides).map(|(c, s)| c * s).sum()
    }

    /// Size of the logical device buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * self.kind.size_bytes()
    }
}

fn checked_len(size: &[usize]) -> Result<usize> {
    if size.is_empty() || size.len() > 3 {
        return Err(Error::UnsupportedDimension(size.len()));
    }
    let mut len = 1usize;
    for (axis, &extent) in size.iter().enumerate() {
        if extent == 0 {
            return Err(Error::InvalidExtent { axis });
        }
        len *= extent;
    }
    Ok(len)
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("spacing", &self.spacing)
            .field("samples", &self.data.len())
            .finish()
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.size == other.size && self.data == other.data
    }
}
