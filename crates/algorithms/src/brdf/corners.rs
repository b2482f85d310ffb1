//! Footprint corner detection

use geo::BoundingRect;
use geo_types::{Coord, Polygon};
use terralux_core::{Error, Result};

/// The four named corners of an acquisition footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub upper_left: Coord<f64>,
    pub upper_right: Coord<f64>,
    pub lower_left: Coord<f64>,
    pub lower_right: Coord<f64>,
}

/// Which coordinate a corner search compares, and in which direction.
#[derive(Clone, Copy)]
enum Axis {
    LonMin,
    LonMax,
    LatMin,
    LatMax,
}

impl Axis {
    fn value(self, c: &Coord<f64>) -> f64 {
        match self {
            Axis::LonMin | Axis::LonMax => c.x,
            Axis::LatMin | Axis::LatMax => c.y,
        }
    }

    /// Whether `a` beats `b` on this axis
    fn prefers(self, a: f64, b: f64) -> bool {
        match self {
            Axis::LonMin | Axis::LatMin => a < b,
            Axis::LonMax | Axis::LatMax => a > b,
        }
    }
}

/// Locate the footprint's corners from its bounding box.
///
/// Each corner starts from one extreme of the axis-aligned bounding box:
/// upper-left from max latitude, upper-right from max longitude, lower-right
/// from min latitude, lower-left from min longitude. The vertex whose
/// coordinate is numerically closest to that extreme is selected; vertices
/// tied on the primary coordinate (as on an axis-parallel footprint edge)
/// are separated by the corner's other coordinate, and any remaining exact
/// tie keeps the first vertex in ring order. Footprints with fewer than 3
/// distinct vertices, or whose selected corners coincide, fail explicitly.
pub fn find_corners(footprint: &Polygon<f64>) -> Result<Corners> {
    let ring: Vec<Coord<f64>> = footprint.exterior().coords().copied().collect();
    // Drop the closing vertex so ties resolve on the open ring.
    let open = match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && rest[0] == *last => rest,
        _ => &ring[..],
    };

    let mut distinct: Vec<Coord<f64>> = Vec::new();
    for coord in open {
        if !distinct.contains(coord) {
            distinct.push(*coord);
        }
    }
    if distinct.len() < 3 {
        return Err(Error::DegenerateFootprint(format!(
            "only {} distinct vertices",
            distinct.len()
        )));
    }

    let bounds = footprint
        .bounding_rect()
        .ok_or_else(|| Error::DegenerateFootprint("empty exterior ring".into()))?;

    let closest = |target: f64, primary: Axis, secondary: Axis| -> Coord<f64> {
        let mut best = open[0];
        let mut best_diff = (primary.value(&best) - target).abs();
        for coord in &open[1..] {
            let diff = (primary.value(coord) - target).abs();
            if diff < best_diff
                || (diff == best_diff
                    && secondary.prefers(secondary.value(coord), secondary.value(&best)))
            {
                best_diff = diff;
                best = *coord;
            }
        }
        best
    };

    let corners = Corners {
        upper_left: closest(bounds.max().y, Axis::LatMax, Axis::LonMin),
        upper_right: closest(bounds.max().x, Axis::LonMax, Axis::LatMax),
        lower_right: closest(bounds.min().y, Axis::LatMin, Axis::LonMax),
        lower_left: closest(bounds.min().x, Axis::LonMin, Axis::LatMin),
    };

    let all = [
        corners.upper_left,
        corners.upper_right,
        corners.lower_right,
        corners.lower_left,
    ];
    for i in 0..all.len() {
        for j in (i + 1)..all.len() {
            if all[i] == all[j] {
                return Err(Error::DegenerateFootprint(
                    "selected corners coincide".into(),
                ));
            }
        }
    }
    Ok(corners)
}
