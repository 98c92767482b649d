//! Pipeline stage driver with guaranteed CPU fallback.
//!
//! A pyramid stage must produce a result whether or not a compute device is
//! present, configured, or healthy. [`GpuPyramidStage`] owns that guarantee:
//! it probes capability, brackets the device attempt in a registration
//! transaction, and unwinds to the CPU reference filter on any failure at any
//! step - without leaking factory registrations or device resources, and
//! without letting device problems cross the stage boundary as errors.
//!
//! # Control flow
//!
//! ```text
//! GpuPyramidStage::generate
//!     +-- flag disabled ------------------> CPU (silent)
//!     +-- dimension <= 2 -----------------> CPU (unprofitable notice)
//!     +-- probe: no context --------------> CPU (context notice)
//!     +-- RegistrationTransaction::open
//!     |       +-- construct GpuPyramid --> on failure: CPU (error notice)
//!     |       +-- prepare device input --> on failure: CPU (error notice)
//!     |       +-- execute ---------------> on failure: CPU (error notice)
//!     +-- transaction closes on every path
//! ```

pub mod config;
pub mod cpu;
pub mod notice;
pub mod stage;

pub use config::{gpu_requested, ParameterMap, ParameterSource};
pub use cpu::{CpuPyramidFilter, ReferencePyramid};
pub use notice::{CollectingSink, Notice, NoticeCategory, NoticeSink, Severity, TracingSink};
pub use stage::{CapabilityState, GpuPyramidStage, StagePhase};

use thiserror::Error;

/// Errors that cross a pipeline stage boundary.
///
/// Device failures never appear here; they are absorbed by fallback. What
/// remains is the fatal registry-inconsistency tier and genuine input
/// defects (bad schedules, malformed images).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error from the dispatch/device layer that is not recoverable by
    /// fallback (registry inconsistency) or occurred on the CPU path.
    #[error(transparent)]
    Compute(#[from] pyr_compute::ComputeError),

    /// Error from the core image types.
    #[error(transparent)]
    Core(#[from] pyr_core::Error),
}

/// Result alias for this crate.
pub type PipelineResult<T> = Result<T, PipelineError>;
