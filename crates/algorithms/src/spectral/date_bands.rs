//! Scalar date-derived bands
//!
//! Constant single-valued bands computed from an image's acquisition instant:
//! `date` (milliseconds since epoch), `doy` (0-based day of year) and `fYear`
//! (year plus the elapsed fraction of that calendar year).

use chrono::{DateTime, Datelike, Timelike, Utc};
use terralux_core::raster::{Band, Grid, Image};
use terralux_core::Result;

/// Band name for the acquisition timestamp in milliseconds since epoch
pub const DATE_BAND: &str = "date";
/// Band name for the 0-based day of year
pub const DOY_BAND: &str = "doy";
/// Band name for the fractional year
pub const FRACTIONAL_YEAR_BAND: &str = "fYear";

/// Append a `date` band holding the acquisition time in ms since epoch
pub fn add_date_band(image: &Image) -> Result<Image> {
    let millis = image.acquired().timestamp_millis() as f64;
    append_constant(image, DATE_BAND, millis)
}

/// Append a `doy` band holding the 0-based day offset within the year
pub fn add_day_of_year_band(image: &Image) -> Result<Image> {
    let doy = image.acquired().ordinal0() as f64;
    append_constant(image, DOY_BAND, doy)
}

/// Append an `fYear` band holding `year + fraction of year elapsed`
pub fn add_fractional_year_band(image: &Image) -> Result<Image> {
    let acquired = image.acquired();
    let fyear = acquired.year() as f64 + year_fraction(acquired);
    append_constant(image, FRACTIONAL_YEAR_BAND, fyear)
}

/// Elapsed fraction of the instant's calendar year, leap-aware.
pub(crate) fn year_fraction(t: DateTime<Utc>) -> f64 {
    let date = t.date_naive();
    let days = if date.leap_year() { 366.0 } else { 365.0 };
    let elapsed = date.ordinal0() as f64 * 86_400.0 + t.num_seconds_from_midnight() as f64;
    elapsed / (days * 86_400.0)
}

fn append_constant(image: &Image, name: &str, value: f64) -> Result<Image> {
    let (rows, cols) = image.shape();
    image
        .clone()
        .with_band(Band::new(name, Grid::filled(rows, cols, value)))
}
