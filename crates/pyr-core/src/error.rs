//! Error types for pyr-core operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or indexing image buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer length does not match the product of the image extents.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected number of samples.
        expected: usize,
        /// Actual number of samples supplied.
        actual: usize,
    },

    /// Spatial dimension outside the supported 1-3 range.
    #[error("unsupported dimension: {0} (supported: 1-3)")]
    UnsupportedDimension(usize),

    /// An extent of zero was supplied.
    #[error("invalid extent: axis {axis} has size 0")]
    InvalidExtent {
        /// Axis with the zero extent.
        axis: usize,
    },

    /// Spacing vector length does not match the image dimension.
    #[error("spacing length {spacing} does not match dimension {dimension}")]
    SpacingMismatch {
        /// Number of spacing entries supplied.
        spacing: usize,
        /// Image dimension.
        dimension: usize,
    },
}
