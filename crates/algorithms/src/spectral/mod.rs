//! Spectral band algebra
//!
//! Per-pixel index expressions over the common band names, scalar
//! date-derived bands, and linear (matrix) band transforms.

mod date_bands;
mod indices;
mod tasseled_cap;

pub use date_bands::{
    add_date_band, add_day_of_year_band, add_fractional_year_band, DATE_BAND, DOY_BAND,
    FRACTIONAL_YEAR_BAND,
};
pub use indices::{compute_indices, SpectralIndex};
pub use tasseled_cap::{matrix_transform, TASSELED_CAP_BANDS};

pub(crate) use date_bands::year_fraction;
pub(crate) use indices::compute_parsed;

/// The common reflective band names, in their fixed order
pub const CANONICAL_BANDS: [&str; 6] = ["blue", "green", "red", "nir", "swir1", "swir2"];
