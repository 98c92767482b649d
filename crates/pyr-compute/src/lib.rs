//! Factory dispatch and device filter graph for GPU pyramid stages.
//!
//! This crate is the middle layer between a pipeline stage and a device
//! kernel set. A stage never names a concrete device filter type; it opens a
//! [`RegistrationTransaction`], which enumerates the supported type matrix
//! and publishes one [`FilterFactory`] per (family, type) combination into a
//! [`FactoryDirectory`]. Device filter graphs such as [`GpuPyramid`] are then
//! constructed purely through directory lookups, and the transaction drains
//! every published entry when it closes - on every exit path.
//!
//! # Architecture
//!
//! ```text
//! RegistrationTransaction (scoped bracket)
//!     +-- enumerate_factories (TypeMatrix x FilterFamily)
//!     |       +-- FactoryProvider (which keys have compiled kernels)
//!     +-- FactoryDirectory (keyed registry, drained on close)
//!             +-- GpuPyramid::from_directory (generic construction)
//! ```
//!
//! The [`host`] module supplies a provider and context that emulate a device
//! on the CPU (rayon); real kernel sets plug in through the same traits.

pub mod context;
pub mod directory;
pub mod factory;
pub mod family;
pub mod filter;
pub mod host;
pub mod kernels;
pub mod matrix;
pub mod pyramid;
pub mod registrar;
pub mod schedule;
pub mod transaction;

pub use context::{ComputeContext, DeviceImage};
pub use directory::FactoryDirectory;
pub use factory::{FactoryProvider, FilterFactory};
pub use family::{FamilyArity, FilterFamily, PYRAMID_FAMILIES};
pub use filter::{DeviceFilter, FilterParams};
pub use matrix::{FactoryKey, TypeMatrix};
pub use pyramid::GpuPyramid;
pub use registrar::enumerate_factories;
pub use schedule::PyramidSchedule;
pub use transaction::RegistrationTransaction;

use thiserror::Error;

/// Errors raised by the dispatch and device filter layer.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// No usable compute context exists.
    #[error("compute context not created")]
    ContextNotCreated,

    /// Generic construction found no factory for the requested key.
    #[error("no factory registered for {0}")]
    FactoryMissing(matrix::FactoryKey),

    /// A factory for this key is already registered.
    #[error("factory already registered for {0}")]
    DuplicateFactory(matrix::FactoryKey),

    /// The type matrix names a combination the provider cannot honor at all.
    ///
    /// This is a build/configuration defect, not a runtime condition; it is
    /// the one error tier a pipeline stage propagates instead of absorbing.
    #[error("factory registry inconsistency: {0}")]
    RegistryInconsistency(String),

    /// Device buffer allocation failed.
    #[error("device allocation failed: {0}")]
    AllocationFailed(String),

    /// Host-to-device transfer failed.
    #[error("device upload failed: {0}")]
    UploadFailed(String),

    /// Device kernel execution failed.
    #[error("device execution failed: {0}")]
    ExecutionFailed(String),

    /// Filter input did not satisfy the filter's contract.
    #[error("invalid filter input: {0}")]
    InvalidInput(String),

    /// Schedule shape does not match the configured level count.
    #[error("schedule has {entries} entries for {levels} levels")]
    ScheduleMismatch {
        /// Configured number of pyramid levels.
        levels: usize,
        /// Entries present in the offending schedule.
        entries: usize,
    },

    /// Error from the core image types.
    #[error(transparent)]
    Core(#[from] pyr_core::Error),
}

/// Result alias for this crate.
pub type ComputeResult<T> = Result<T, ComputeError>;
