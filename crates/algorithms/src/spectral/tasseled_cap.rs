//! Linear band transforms
//!
//! Matrix multiplication between an image's common reflective bands and a
//! coefficient matrix, e.g. a Tasseled Cap rotation.

use crate::maybe_rayon::*;
use crate::spectral::CANONICAL_BANDS;
use ndarray::Array2;
use terralux_core::raster::{Band, Grid, Image};
use terralux_core::{Error, Result};

/// Output band names for the Tasseled Cap transform
pub const TASSELED_CAP_BANDS: [&str; 6] = ["TC1", "TC2", "TC3", "TC4", "TC5", "TC6"];

/// Apply a 6x6 linear transform over the common reflective bands.
///
/// `output[j] = sum_i coef[j][i] * band[i]` with the input bands read in the
/// fixed order {blue, green, red, nir, swir1, swir2}. The transformed bands
/// are appended under `band_names`; existing bands are preserved.
pub fn matrix_transform(
    image: &Image,
    coef: &[[f64; 6]; 6],
    band_names: &[&str; 6],
) -> Result<Image> {
    let grids: Vec<&Grid> = CANONICAL_BANDS
        .iter()
        .map(|name| image.require_band(name))
        .collect::<Result<Vec<_>>>()?;
    let (rows, cols) = image.shape();

    // One pass per pixel computes all six outputs.
    let data: Vec<[f64; 6]> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![[f64::NAN; 6]; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mut input = [0.0; 6];
                for (i, grid) in grids.iter().enumerate() {
                    input[i] = unsafe { grid.get_unchecked(row, col) };
                }
                for (j, row_coef) in coef.iter().enumerate() {
                    out[j] = row_coef
                        .iter()
                        .zip(input.iter())
                        .map(|(c, v)| c * v)
                        .sum();
                }
            }
            row_data
        })
        .collect();

    let mut result = image.clone();
    for (j, name) in band_names.iter().enumerate() {
        let values: Vec<f64> = data.iter().map(|px| px[j]).collect();
        let array = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        result = result.with_band(Band::new(*name, Grid::from_array(array)))?;
    }
    Ok(result)
}
