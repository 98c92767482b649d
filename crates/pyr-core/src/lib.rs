//! # pyr-core
//!
//! Core types for multi-resolution image pyramid processing.
//!
//! This crate provides the foundational types used throughout the PYR
//! workspace:
//!
//! - [`PixelKind`] - The logical pixel types a device kernel set is compiled for
//! - [`Image`] - An n-dimensional (1-3) image buffer with f32 sample storage
//! - [`Error`], [`Result`] - Unified error handling
//!
//! ## Crate Structure
//!
//! This crate is the foundation of the workspace and has no internal
//! dependencies:
//!
//! ```text
//! pyr-core (this crate)
//!    ^
//!    |
//!    +-- pyr-compute (factories, registry, device filters)
//!    +-- pyr-pipeline (stage driver, CPU fallback)
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod pixel;

pub use error::{Error, Result};
pub use image::Image;
pub use pixel::PixelKind;
