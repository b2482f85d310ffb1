//! BRDF radiometric normalization
//!
//! Rescales the common reflective bands of a scene to a nadir view under a
//! fixed reference illumination, removing the across-track brightness
//! gradient caused by the bidirectional reflectance of the surface. The
//! pipeline is pure and per-image: footprint corners, per-pixel view
//! geometry, per-pixel solar position, kernel evaluation at the actual and
//! reference geometries, and correction-factor application.

mod corners;
mod geometry;
mod kernel;
mod solar;

pub use corners::{find_corners, Corners};
pub use geometry::{view_angles, ViewAngles, MAX_SATELLITE_ZENITH};
pub use kernel::{
    correction_factor, kernel, kernel_reflectance, reference_sun_zenith, BandCoefficients,
    Kernel, BRDF_COEFFICIENTS,
};
pub use solar::{solar_position, SolarAngles};

use crate::maybe_rayon::*;
use crate::spectral::CANONICAL_BANDS;
use ndarray::Array2;
use std::f64::consts::PI;
use terralux_core::raster::{Band, Grid, Image};
use terralux_core::{Error, Result};

/// Options for [`apply_brdf_correction`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrdfOptions {
    /// Also expose every intermediate calculation as bands
    pub debug: bool,
}

/// Relative azimuth of the fixed reference geometry
const REFERENCE_RELATIVE_AZIMUTH: f64 = PI;

/// Apply the BRDF correction to a scene.
///
/// The six common reflective bands are overwritten with corrected values;
/// all other bands and the metadata are preserved. Requires the image's
/// footprint and acquisition timestamp. With `debug` set, the kernel values,
/// modeled reflectances and correction factors are appended as extra bands.
pub fn apply_brdf_correction(image: &Image, options: &BrdfOptions) -> Result<Image> {
    let footprint = image.footprint().ok_or(Error::MissingFootprint)?;
    for band in CANONICAL_BANDS {
        image.require_band(band)?;
    }
    log::debug!("BRDF correction of scene acquired {}", image.acquired());

    let view = view_angles(footprint, image.transform(), image.shape())?;
    let solar = solar_position(image.acquired(), image.transform(), image.shape())?;

    let (rows, cols) = image.shape();
    let transform = *image.transform();
    let sun_zenith = &solar.zenith;
    let sun_azimuth = &solar.azimuth;
    let view_zenith = &view.zenith;
    let view_azimuth = view.azimuth;

    // Kernels at the actual and reference geometries, one pass per pixel.
    let kernels: Vec<(Kernel, Kernel)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                let sun_zen = unsafe { sun_zenith.get_unchecked(row, col) };
                let sun_az = unsafe { sun_azimuth.get_unchecked(row, col) };
                let view_zen = unsafe { view_zenith.get_unchecked(row, col) };
                let relative_az = view_azimuth - sun_az;

                let sensor = kernel(sun_zen, view_zen, relative_az);
                let (_, lat) = transform.pixel_to_geo(col, row);
                let reference = kernel(
                    reference_sun_zenith(lat),
                    0.0,
                    REFERENCE_RELATIVE_AZIMUTH,
                );
                row_data.push((sensor, reference));
            }
            row_data
        })
        .collect();

    let mut out = image.clone();
    if options.debug {
        let kv_norm = kernels.iter().map(|(_, norm)| norm.k_vol).collect();
        let kg_norm = kernels.iter().map(|(_, norm)| norm.k_geo).collect();
        let kv_sensor = kernels.iter().map(|(sensor, _)| sensor.k_vol).collect();
        let kg_sensor = kernels.iter().map(|(sensor, _)| sensor.k_geo).collect();
        out = out
            .with_band(Band::new("k_vol_norm", grid_from(kv_norm, (rows, cols))?))?
            .with_band(Band::new("k_geo_norm", grid_from(kg_norm, (rows, cols))?))?
            .with_band(Band::new("k_vol_sensor", grid_from(kv_sensor, (rows, cols))?))?
            .with_band(Band::new("k_geo_sensor", grid_from(kg_sensor, (rows, cols))?))?;
    }

    for coef in &BRDF_COEFFICIENTS {
        let raw = image.require_band(coef.band)?;

        let mut corrected = Vec::with_capacity(rows * cols);
        let mut factors = Vec::with_capacity(if options.debug { rows * cols } else { 0 });
        let mut p_norm = Vec::with_capacity(if options.debug { rows * cols } else { 0 });
        let mut p_sensor = Vec::with_capacity(if options.debug { rows * cols } else { 0 });
        for (idx, (sensor, reference)) in kernels.iter().enumerate() {
            let (row, col) = (idx / cols, idx % cols);
            let value = unsafe { raw.get_unchecked(row, col) };
            let factor = correction_factor(sensor, reference, coef);
            corrected.push(value * factor);
            if options.debug {
                factors.push(factor);
                p_norm.push(kernel_reflectance(reference, coef));
                p_sensor.push(kernel_reflectance(sensor, coef));
            }
        }

        out = out.with_band_overwrite(Band::new(coef.band, grid_from(corrected, (rows, cols))?))?;
        if options.debug {
            out = out
                .with_band(Band::new(
                    format!("{}_brdf_norm", coef.band),
                    grid_from(p_norm, (rows, cols))?,
                ))?
                .with_band(Band::new(
                    format!("{}_brdf_sensor", coef.band),
                    grid_from(p_sensor, (rows, cols))?,
                ))?
                .with_band(Band::new(
                    format!("{}_cFactor", coef.band),
                    grid_from(factors, (rows, cols))?,
                ))?;
        }
    }
    Ok(out)
}

fn grid_from(data: Vec<f64>, shape: (usize, usize)) -> Result<Grid> {
    let array = Array2::from_shape_vec(shape, data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Grid::from_array(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use geo_types::polygon;
    use terralux_core::raster::{GeoTransform, ImageMetadata};

    fn scene() -> Image {
        let footprint = polygon![
            (x: 10.0, y: 40.0),
            (x: 12.0, y: 40.0),
            (x: 12.0, y: 42.0),
            (x: 10.0, y: 42.0),
        ];
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, 10, 10, 15, 0).unwrap())
            .with_footprint(footprint);
        let mut img = Image::new((4, 4), GeoTransform::new(10.0, 42.0, 0.5, -0.5), meta);
        for (i, name) in CANONICAL_BANDS.iter().enumerate() {
            img = img
                .with_band(Band::new(*name, Grid::filled(4, 4, 0.1 + 0.05 * i as f64)))
                .unwrap();
        }
        img.with_band(Band::new("thermal", Grid::filled(4, 4, 290.0)))
            .unwrap()
    }

    #[test]
    fn test_corrects_reflective_bands_only() {
        let img = scene();
        let corrected = apply_brdf_correction(&img, &BrdfOptions::default()).unwrap();

        assert_eq!(corrected.band_names(), img.band_names(), "band set unchanged");
        // Thermal band untouched.
        assert_eq!(corrected.band("thermal").unwrap().get(0, 0).unwrap(), 290.0);
        // Reflective bands rescaled to finite, positive values.
        for name in CANONICAL_BANDS {
            let v = corrected.band(name).unwrap().get(2, 2).unwrap();
            assert!(v.is_finite() && v > 0.0, "{}: got {}", name, v);
        }
    }

    #[test]
    fn test_correction_factor_is_moderate() {
        // A nadir-normalized scene should not change reflectance wildly.
        let img = scene();
        let corrected = apply_brdf_correction(&img, &BrdfOptions::default()).unwrap();
        let before = img.band("nir").unwrap().get(1, 1).unwrap();
        let after = corrected.band("nir").unwrap().get(1, 1).unwrap();
        let ratio = after / before;
        assert!(ratio > 0.5 && ratio < 2.0, "ratio {}", ratio);
    }

    #[test]
    fn test_debug_exposes_intermediates() {
        let img = scene();
        let corrected = apply_brdf_correction(&img, &BrdfOptions { debug: true }).unwrap();

        for name in ["k_vol_norm", "k_geo_norm", "k_vol_sensor", "k_geo_sensor"] {
            assert!(corrected.has_band(name), "missing {}", name);
        }
        for band in CANONICAL_BANDS {
            assert!(corrected.has_band(&format!("{}_brdf_norm", band)));
            assert!(corrected.has_band(&format!("{}_brdf_sensor", band)));
            assert!(corrected.has_band(&format!("{}_cFactor", band)));
        }

        // The debug factor reproduces the correction exactly.
        let raw = img.band("red").unwrap().get(0, 0).unwrap();
        let corrected_value = corrected.band("red").unwrap().get(0, 0).unwrap();
        let factor = corrected.band("red_cFactor").unwrap().get(0, 0).unwrap();
        assert_eq!(corrected_value, raw * factor);
    }

    #[test]
    fn test_missing_footprint_is_error() {
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, 10, 10, 15, 0).unwrap());
        let mut img = Image::new((2, 2), GeoTransform::default(), meta);
        for name in CANONICAL_BANDS {
            img = img
                .with_band(Band::new(name, Grid::filled(2, 2, 0.2)))
                .unwrap();
        }
        let result = apply_brdf_correction(&img, &BrdfOptions::default());
        assert!(matches!(result, Err(Error::MissingFootprint)));
    }

    #[test]
    fn test_missing_reflective_band_is_error() {
        let footprint = polygon![
            (x: 10.0, y: 40.0),
            (x: 12.0, y: 40.0),
            (x: 12.0, y: 42.0),
            (x: 10.0, y: 42.0),
        ];
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, 10, 10, 15, 0).unwrap())
            .with_footprint(footprint);
        let img = Image::new((2, 2), GeoTransform::default(), meta)
            .with_band(Band::new("blue", Grid::filled(2, 2, 0.2)))
            .unwrap();
        let result = apply_brdf_correction(&img, &BrdfOptions::default());
        assert!(matches!(result, Err(Error::BandNotFound { .. })));
    }
}
