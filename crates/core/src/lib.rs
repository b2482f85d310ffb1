//! # Terralux Core
//!
//! Core types for the terralux raster preprocessing library.
//!
//! This crate provides:
//! - [`Grid`]: a single-band 2-D pixel grid (NaN = masked)
//! - [`Image`]: an immutable multi-band grid with scalar metadata
//! - [`ImageSequence`]: an ordered collection of images
//! - [`GeoTransform`]: affine pixel-to-geographic mapping
//! - Shared [`Error`]/[`Result`] types
//!
//! All transforms built on these types are pure: images are never mutated in
//! place, and per-pixel operations are independent of all other pixels, so an
//! execution engine may parallelize arbitrarily within an image.

pub mod error;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{Band, GeoTransform, Grid, Image, ImageMetadata, ImageSequence};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Band, GeoTransform, Grid, Image, ImageMetadata, ImageSequence};
}
