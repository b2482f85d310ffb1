//! Per-pixel solar position
//!
//! Solar zenith and azimuth from pixel longitude/latitude and the acquisition
//! instant, using the POSSOL Fourier-series approximations for the equation
//! of time and the solar declination. The empirical coefficients are copied
//! verbatim for numeric parity with the reference implementation.

use crate::maybe_rayon::*;
use crate::spectral::year_fraction;
use chrono::{DateTime, Timelike, Utc};
use ndarray::Array2;
use std::f64::consts::PI;
use terralux_core::raster::{GeoTransform, Grid};
use terralux_core::{Error, Result};

/// Per-pixel solar geometry for one scene.
#[derive(Debug, Clone)]
pub struct SolarAngles {
    /// Per-pixel solar zenith in radians
    pub zenith: Grid,
    /// Per-pixel solar azimuth in radians, clockwise in [0, 2*pi)
    pub azimuth: Grid,
}

/// Compute the per-pixel solar position at the given instant.
pub fn solar_position(
    acquired: DateTime<Utc>,
    transform: &GeoTransform,
    shape: (usize, usize),
) -> Result<SolarAngles> {
    // Julian date proportion, in radians.
    let jdpr = year_fraction(acquired) * 2.0 * PI;
    let seconds_gmt = acquired.num_seconds_from_midnight() as f64;

    // Equation of time, in minutes.
    let solar_diff = (0.000075 + 0.001868 * jdpr.cos() - 0.032077 * jdpr.sin()
        - 0.014615 * (2.0 * jdpr).cos()
        - 0.040849 * (2.0 * jdpr).sin())
        * 12.0
        * 60.0
        / PI;

    // Solar declination, in radians.
    let delta = 0.006918 - 0.399912 * jdpr.cos() + 0.070257 * jdpr.sin()
        - 0.006758 * (2.0 * jdpr).cos()
        + 0.000907 * (2.0 * jdpr).sin()
        - 0.002697 * (3.0 * jdpr).cos()
        + 0.001480 * (3.0 * jdpr).sin();

    let (rows, cols) = shape;
    let angles: Vec<(f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(f64::NAN, f64::NAN); cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (lon_deg, lat_deg) = transform.pixel_to_geo(col, row);
                *out = pixel_solar_angles(lon_deg, lat_deg.to_radians(), seconds_gmt, solar_diff, delta);
            }
            row_data
        })
        .collect();

    let zenith: Vec<f64> = angles.iter().map(|(zen, _)| *zen).collect();
    let azimuth: Vec<f64> = angles.iter().map(|(_, az)| *az).collect();
    Ok(SolarAngles {
        zenith: Grid::from_array(
            Array2::from_shape_vec((rows, cols), zenith).map_err(|e| Error::Other(e.to_string()))?,
        ),
        azimuth: Grid::from_array(
            Array2::from_shape_vec((rows, cols), azimuth)
                .map_err(|e| Error::Other(e.to_string()))?,
        ),
    })
}

/// Solar zenith and azimuth for one pixel.
fn pixel_solar_angles(
    lon_deg: f64,
    lat_rad: f64,
    seconds_gmt: f64,
    solar_diff: f64,
    delta: f64,
) -> (f64, f64) {
    let mean_solar_time = seconds_gmt / 3600.0 + lon_deg / 15.0;
    let true_solar_time = mean_solar_time + solar_diff / 60.0 - 12.0;
    let angle_hour = true_solar_time * 15.0 * PI / 180.0;

    let cos_sun_zen =
        lat_rad.sin() * delta.sin() + lat_rad.cos() * delta.cos() * angle_hour.cos();
    let sun_zen = cos_sun_zen.acos();

    // Azimuth in the south-west convention, then rebased clockwise from north.
    let sin_az_sw = (delta.cos() * angle_hour.sin() / sun_zen.sin()).clamp(-1.0, 1.0);
    let cos_az_sw = (-lat_rad.cos() * delta.sin()
        + lat_rad.sin() * delta.cos() * angle_hour.cos())
        / sun_zen.sin();

    let mut az_sw = sin_az_sw.asin();
    if cos_az_sw <= 0.0 {
        az_sw = PI - az_sw;
    } else if sin_az_sw <= 0.0 {
        az_sw += 2.0 * PI;
    }

    let mut sun_az = az_sw + PI;
    if sun_az > 2.0 * PI {
        sun_az -= 2.0 * PI;
    }
    (sun_zen, sun_az)
}
