//! # Terralux Algorithms
//!
//! Transforms for the terralux raster preprocessing pipeline.
//!
//! ## Components
//!
//! - **spectral**: spectral index algebra, date-derived bands, linear band
//!   transforms
//! - **dataset**: image sequences with a tracked band catalog, filtering and
//!   merging
//! - **compositing**: fixed-window temporal reduction and medoid selection
//! - **sensor**: Landsat-family QA masking, scaling, renaming and Tasseled
//!   Cap
//! - **brdf**: kernel-based normalization of reflectance to nadir geometry
//! - **pipeline**: per-image transforms as replayable stage descriptions
//!
//! Everything operates on immutable [`terralux_core`] values; every transform
//! returns a new image or dataset.

pub mod brdf;
pub mod compositing;
pub mod dataset;
pub mod pipeline;
pub mod sensor;
pub mod spectral;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::brdf::{apply_brdf_correction, find_corners, BrdfOptions};
    pub use crate::compositing::{
        create_medoid_composite, create_medoid_reducer, create_temporal_composites,
        CompositeConfig, IntervalUnit, Reducer,
    };
    pub use crate::dataset::Dataset;
    pub use crate::pipeline::{ImagePipeline, ImageStage};
    pub use crate::sensor::{landsat5, landsat7, landsat8, CommonBand, Landsat, SensorSpec};
    pub use crate::spectral::{compute_indices, SpectralIndex, CANONICAL_BANDS};
    pub use terralux_core::prelude::*;
}
