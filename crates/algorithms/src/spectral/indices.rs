//! Spectral index algebra
//!
//! The fixed catalog of per-pixel band-algebra expressions computed from the
//! common band names. The formula table is a stable numerical contract:
//! downstream consumers depend on these exact expressions.

use crate::maybe_rayon::*;
use crate::spectral::CANONICAL_BANDS;
use ndarray::Array2;
use terralux_core::raster::{Band, Grid, Image};
use terralux_core::{Error, Result};

/// Enumeration of the supported spectral indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Enhanced Vegetation Index
    Evi,
    /// Soil Adjusted Vegetation Index
    Savi,
    /// Modified Soil Adjusted Vegetation Index
    Msavi,
    /// Normalized Difference Moisture Index
    Ndmi,
    /// Normalized Burn Ratio
    Nbr,
    /// Normalized Burn Ratio 2
    Nbr2,
    /// Normalized Difference Water Index (same expression as NDMI)
    Ndwi,
    /// Modified Normalized Difference Water Index
    Mndwi,
    /// Normalized Difference Built-Up Index
    Ndbi,
    /// Normalized Difference Snow Index
    Ndsi,
}

/// Per-pixel values of the common reflective bands.
///
/// Bands an index does not reference are NaN and never read.
#[derive(Debug, Clone, Copy)]
struct Reflectance {
    blue: f64,
    green: f64,
    red: f64,
    nir: f64,
    swir1: f64,
    swir2: f64,
}

impl SpectralIndex {
    /// Every index in the catalog
    pub const ALL: [SpectralIndex; 11] = [
        SpectralIndex::Ndvi,
        SpectralIndex::Evi,
        SpectralIndex::Savi,
        SpectralIndex::Msavi,
        SpectralIndex::Ndmi,
        SpectralIndex::Nbr,
        SpectralIndex::Nbr2,
        SpectralIndex::Ndwi,
        SpectralIndex::Mndwi,
        SpectralIndex::Ndbi,
        SpectralIndex::Ndsi,
    ];

    /// Look up an index by its catalog name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.name() == name)
    }

    /// The catalog name, which is also the output band name
    pub fn name(self) -> &'static str {
        match self {
            SpectralIndex::Ndvi => "ndvi",
            SpectralIndex::Evi => "evi",
            SpectralIndex::Savi => "savi",
            SpectralIndex::Msavi => "msavi",
            SpectralIndex::Ndmi => "ndmi",
            SpectralIndex::Nbr => "nbr",
            SpectralIndex::Nbr2 => "nbr2",
            SpectralIndex::Ndwi => "ndwi",
            SpectralIndex::Mndwi => "mndwi",
            SpectralIndex::Ndbi => "ndbi",
            SpectralIndex::Ndsi => "ndsi",
        }
    }

    /// The common bands the index's expression reads
    pub fn required_bands(self) -> &'static [&'static str] {
        match self {
            SpectralIndex::Ndvi | SpectralIndex::Savi | SpectralIndex::Msavi => &["nir", "red"],
            SpectralIndex::Evi => &["nir", "red", "blue"],
            SpectralIndex::Ndmi | SpectralIndex::Ndwi => &["nir", "swir1"],
            SpectralIndex::Nbr => &["nir", "swir2"],
            SpectralIndex::Nbr2 => &["swir1", "swir2"],
            SpectralIndex::Mndwi => &["green", "swir2"],
            SpectralIndex::Ndbi => &["swir1", "nir"],
            SpectralIndex::Ndsi => &["green", "swir1"],
        }
    }

    /// Evaluate the index expression for one pixel.
    ///
    /// A denominator of exactly 0 yields NaN; NaN inputs propagate by IEEE
    /// semantics. No other masking is applied.
    fn eval(self, b: Reflectance) -> f64 {
        match self {
            SpectralIndex::Ndvi => ratio(b.nir - b.red, b.nir + b.red),
            SpectralIndex::Evi => ratio(
                2.5 * (b.nir - b.red),
                b.nir + 6.0 * b.red - 7.5 * b.blue + 1.0,
            ),
            SpectralIndex::Savi => ratio(1.5 * (b.nir - b.red), b.nir + b.red + 0.5),
            SpectralIndex::Msavi => {
                let s = 2.0 * b.nir + 1.0;
                (s - (s * s - 8.0 * (b.nir - b.red)).sqrt()) / 2.0
            }
            SpectralIndex::Ndmi | SpectralIndex::Ndwi => {
                ratio(b.nir - b.swir1, b.nir + b.swir1)
            }
            SpectralIndex::Nbr => ratio(b.nir - b.swir2, b.nir + b.swir2),
            SpectralIndex::Nbr2 => ratio(b.swir1 - b.swir2, b.swir1 + b.swir2),
            SpectralIndex::Mndwi => ratio(b.green - b.swir2, b.green + b.swir2),
            SpectralIndex::Ndbi => ratio(b.swir1 - b.nir, b.swir1 + b.nir),
            SpectralIndex::Ndsi => ratio(b.green - b.swir1, b.green + b.swir1),
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        f64::NAN
    } else {
        num / den
    }
}

/// Compute the named spectral indices and append them as new bands.
///
/// Index names are validated against the catalog before anything is computed:
/// a single unrecognized name fails the entire call, naming the offending
/// identifier. Each index is evaluated over the source image's common bands,
/// so indices never read each other's output. Existing bands are preserved.
pub fn compute_indices(image: &Image, names: &[&str]) -> Result<Image> {
    let indices = names
        .iter()
        .map(|name| {
            SpectralIndex::parse(name).ok_or_else(|| Error::UnknownSpectralIndex {
                name: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    compute_parsed(image, &indices)
}

/// Compute already-validated indices and append them as new bands.
pub(crate) fn compute_parsed(image: &Image, indices: &[SpectralIndex]) -> Result<Image> {
    let mut out = image.clone();
    for &index in indices {
        let grid = evaluate(image, index)?;
        out = out.with_band(Band::new(index.name(), grid))?;
    }
    Ok(out)
}

/// Evaluate a single index over the image's common bands.
fn evaluate(image: &Image, index: SpectralIndex) -> Result<Grid> {
    for band in index.required_bands() {
        image.require_band(band)?;
    }

    let grids: Vec<Option<&Grid>> = CANONICAL_BANDS
        .iter()
        .map(|name| image.band(name))
        .collect();
    let (rows, cols) = image.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let fetch = |i: usize| -> f64 {
                    grids[i].map_or(f64::NAN, |g| unsafe { g.get_unchecked(row, col) })
                };
                let b = Reflectance {
                    blue: fetch(0),
                    green: fetch(1),
                    red: fetch(2),
                    nir: fetch(3),
                    swir1: fetch(4),
                    swir2: fetch(5),
                };
                *out = index.eval(b);
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Grid::from_array(array))
}
