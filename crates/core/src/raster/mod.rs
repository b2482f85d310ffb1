//! Raster data structures

mod geotransform;
mod grid;
mod image;
mod sequence;

pub use geotransform::GeoTransform;
pub use grid::Grid;
pub use image::{Band, Image, ImageMetadata};
pub use sequence::ImageSequence;
