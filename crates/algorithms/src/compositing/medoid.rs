//! Medoid compositing
//!
//! Selects, independently at every pixel, the one complete source image whose
//! values on a set of index bands lie closest to the per-pixel median of
//! those bands, and copies that image's values across *all* bands. The output
//! is never a blend: each pixel equals exactly one input observation.

use crate::compositing::temporal::{check_uniform, median_grid, Reducer};
use crate::maybe_rayon::*;
use ndarray::Array2;
use terralux_core::raster::{Band, Grid, Image, ImageSequence};
use terralux_core::{Error, Result};

/// Compute a medoid composite over a whole sequence.
///
/// `bands` names the index bands the distance is measured on: the absolute
/// difference from the per-pixel median for a single band, the sum of squared
/// differences otherwise. The winning image contributes every band it has at
/// that pixel. Distance ties keep the earliest image in sequence order.
/// Pixels where no source has valid index values are masked on all bands.
///
/// The composite keeps the first image's metadata.
pub fn create_medoid_composite(sequence: &ImageSequence, bands: &[&str]) -> Result<Image> {
    let images: Vec<&Image> = sequence.iter().collect();
    medoid_of(&images, bands)
}

/// A reducer that applies medoid selection per compositing window.
pub fn create_medoid_reducer(bands: &[&str]) -> Reducer {
    Reducer::Medoid {
        bands: bands.iter().map(|b| b.to_string()).collect(),
    }
}

/// Medoid composite over an explicit set of images.
pub(crate) fn medoid_of(images: &[&Image], bands: &[&str]) -> Result<Image> {
    let template = *images
        .first()
        .ok_or(Error::EmptySequence("medoid composite"))?;
    check_uniform(images, template)?;
    let shape = template.shape();
    let (rows, cols) = shape;
    log::debug!(
        "medoid composite over {} images, indexed on {:?}",
        images.len(),
        bands
    );

    // Index-band grids per image, and their per-pixel medians.
    let index_grids: Vec<Vec<&Grid>> = images
        .iter()
        .map(|img| {
            bands
                .iter()
                .map(|band| img.require_band(band))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let medians: Vec<Grid> = (0..bands.len())
        .map(|b| {
            let stack: Vec<&Grid> = index_grids.iter().map(|grids| grids[b]).collect();
            median_grid(&stack, shape)
        })
        .collect::<Result<Vec<_>>>()?;

    // Winner pass: the index (in sequence order) of the closest image per
    // pixel, or -1 where no image has valid index values. Only a strictly
    // smaller distance displaces the incumbent, so exact ties keep the
    // earliest image.
    let single_band = bands.len() == 1;
    let winners: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_winners = vec![-1i32; cols];
            for (col, winner) in row_winners.iter_mut().enumerate() {
                let mut best = f64::INFINITY;
                for (i, grids) in index_grids.iter().enumerate() {
                    let mut distance = 0.0;
                    for (b, grid) in grids.iter().enumerate() {
                        let v = unsafe { grid.get_unchecked(row, col) };
                        let m = unsafe { medians[b].get_unchecked(row, col) };
                        let diff = v - m;
                        distance += if single_band { diff.abs() } else { diff * diff };
                    }
                    // NaN distances (masked value or masked median) never win.
                    if distance < best {
                        best = distance;
                        *winner = i as i32;
                    }
                }
            }
            row_winners
        })
        .collect();

    // Gather pass: every band of the winning image.
    let mut out = Image::new(shape, *template.transform(), template.metadata().clone());
    for band in template.bands() {
        let grids: Vec<&Grid> = images
            .iter()
            .map(|img| img.require_band(band.name()))
            .collect::<Result<Vec<_>>>()?;

        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                for (col, out) in row_data.iter_mut().enumerate() {
                    let winner = winners[row * cols + col];
                    if winner >= 0 {
                        *out = unsafe { grids[winner as usize].get_unchecked(row, col) };
                    }
                }
                row_data
            })
            .collect();

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        out = out.with_band(Band::new(band.name(), Grid::from_array(array)))?;
    }
    Ok(out)
}
