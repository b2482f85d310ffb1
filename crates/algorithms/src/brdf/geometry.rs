//! Per-pixel view geometry
//!
//! The viewing azimuth is assumed constant and at right angles to the scene's
//! nadir track, estimated from the footprint's center line. The viewing
//! zenith is interpolated linearly across track, from -maxZenith at the right
//! scene edge to +maxZenith at the left edge.

use crate::brdf::corners::{find_corners, Corners};
use crate::maybe_rayon::*;
use geo_types::{Coord, Polygon};
use ndarray::Array2;
use std::f64::consts::{FRAC_PI_2, PI};
use terralux_core::raster::{GeoTransform, Grid};
use terralux_core::{Error, Result};

/// Maximum satellite zenith angle at the scene edge, in degrees
pub const MAX_SATELLITE_ZENITH: f64 = 7.5;

/// Per-pixel viewing geometry for one scene.
#[derive(Debug, Clone)]
pub struct ViewAngles {
    /// Viewing azimuth in radians, constant across the scene
    pub azimuth: f64,
    /// Per-pixel viewing zenith in radians
    pub zenith: Grid,
}

/// Compute viewing angles from the scene's footprint.
///
/// Degenerate center-line geometry (coincident corner midpoints) propagates
/// as NaN angles rather than an error.
pub fn view_angles(
    footprint: &Polygon<f64>,
    transform: &GeoTransform,
    shape: (usize, usize),
) -> Result<ViewAngles> {
    let corners = find_corners(footprint)?;

    let upper_center = midpoint(corners.upper_left, corners.upper_right);
    let lower_center = midpoint(corners.lower_left, corners.lower_right);
    let slope = slope_between(lower_center, upper_center);
    let azimuth = FRAC_PI_2 - (-1.0 / slope).atan();

    let zenith = zenith_grid(&corners, transform, shape)?;
    Ok(ViewAngles { azimuth, zenith })
}

fn zenith_grid(
    corners: &Corners,
    transform: &GeoTransform,
    shape: (usize, usize),
) -> Result<Grid> {
    let (rows, cols) = shape;
    let max_zenith = MAX_SATELLITE_ZENITH;
    let left_a = corners.upper_left;
    let left_b = corners.lower_left;
    let right_a = corners.upper_right;
    let right_b = corners.lower_right;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (lon, lat) = transform.pixel_to_geo(col, row);
                let p = Coord { x: lon, y: lat };
                let left = line_distance(left_a, left_b, p);
                let right = line_distance(right_a, right_b, p);
                *out = ((right * max_zenith * 2.0) / (right + left) - max_zenith) * PI / 180.0;
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Grid::from_array(array))
}

fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

fn slope_between(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.y - b.y) / (a.x - b.x)
}

/// Perpendicular distance from a point to the line through `a` and `b`.
///
/// Computed on the lon/lat plane; the zenith interpolation only uses the
/// ratio of the two edge distances, which is unit-invariant.
fn line_distance(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
    cross.abs() / (dx * dx + dy * dy).sqrt()
}
