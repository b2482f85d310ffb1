//! Fixed-window temporal compositing

use crate::compositing::medoid::medoid_of;
use crate::maybe_rayon::*;
use chrono::{DateTime, Duration, Months, Utc};
use ndarray::Array2;
use terralux_core::raster::{Band, Grid, Image, ImageMetadata, ImageSequence};
use terralux_core::{Error, Result};

/// Units for the compositing interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl IntervalUnit {
    /// Advance an instant by `amount` units.
    ///
    /// Years and months use calendar arithmetic; the remaining units are
    /// fixed durations.
    pub fn advance(self, start: DateTime<Utc>, amount: i64) -> Result<DateTime<Utc>> {
        let advanced = match self {
            IntervalUnit::Years => add_months(start, amount.checked_mul(12)),
            IntervalUnit::Months => add_months(start, Some(amount)),
            IntervalUnit::Weeks => Duration::try_weeks(amount)
                .and_then(|d| start.checked_add_signed(d)),
            IntervalUnit::Days => Duration::try_days(amount)
                .and_then(|d| start.checked_add_signed(d)),
            IntervalUnit::Hours => Duration::try_hours(amount)
                .and_then(|d| start.checked_add_signed(d)),
            IntervalUnit::Minutes => Duration::try_minutes(amount)
                .and_then(|d| start.checked_add_signed(d)),
            IntervalUnit::Seconds => Duration::try_seconds(amount)
                .and_then(|d| start.checked_add_signed(d)),
        };
        advanced.ok_or_else(|| {
            Error::DateOutOfRange(format!("{} + {} {:?}", start, amount, self))
        })
    }
}

fn add_months(start: DateTime<Utc>, months: Option<i64>) -> Option<DateTime<Utc>> {
    let months = months?;
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        start.checked_add_months(magnitude)
    } else {
        start.checked_sub_months(magnitude)
    }
}

/// Configuration for [`create_temporal_composites`]
#[derive(Debug, Clone)]
pub struct CompositeConfig {
    /// Start of the first window
    pub start: DateTime<Utc>,
    /// Number of windows to generate
    pub count: u32,
    /// Window length, in `unit`s
    pub interval: i64,
    /// Units of `interval`
    pub unit: IntervalUnit,
}

/// Band-wise reducer applied to the images selected by a window
#[derive(Debug, Clone, Default)]
pub enum Reducer {
    /// Per-pixel, per-band median of the selected images
    #[default]
    Median,
    /// Medoid selection indexed on the named bands
    Medoid { bands: Vec<String> },
}

/// Reduce a sequence into one composite per fixed time window.
///
/// Windows are half-open: `[start + k*interval, start + (k+1)*interval)` for
/// `k` in `0..count`, and every image whose timestamp falls inside a window
/// contributes to that window's composite. Each output is tagged with the
/// window start date and the number of contributing images. A window with no
/// contributing images yields a fully masked composite with
/// `observations = 0`; it is not an error. Outputs are ordered by window.
pub fn create_temporal_composites(
    sequence: &ImageSequence,
    config: &CompositeConfig,
    reducer: &Reducer,
) -> Result<ImageSequence> {
    let template = sequence
        .first()
        .ok_or(Error::EmptySequence("temporal composites"))?;
    log::debug!(
        "compositing {} images into {} windows of {} {:?}",
        sequence.len(),
        config.count,
        config.interval,
        config.unit
    );

    let mut composites = Vec::with_capacity(config.count as usize);
    for k in 0..config.count as i64 {
        let begin = config.unit.advance(config.start, config.interval * k)?;
        let end = config.unit.advance(config.start, config.interval * (k + 1))?;

        let selected: Vec<&Image> = sequence
            .iter()
            .filter(|img| img.acquired() >= begin && img.acquired() < end)
            .collect();

        let composite = if selected.is_empty() {
            masked_like(template)?
        } else {
            match reducer {
                Reducer::Median => median_of(&selected)?,
                Reducer::Medoid { bands } => {
                    let bands: Vec<&str> = bands.iter().map(String::as_str).collect();
                    medoid_of(&selected, &bands)?
                }
            }
        };

        let mut metadata = ImageMetadata::new(begin);
        metadata.observations = Some(selected.len() as u32);
        composites.push(composite.with_metadata(metadata));
    }
    Ok(ImageSequence::new(composites))
}

/// An all-masked image with the template's bands, shape and transform.
fn masked_like(template: &Image) -> Result<Image> {
    let (rows, cols) = template.shape();
    let mut out = Image::new(
        template.shape(),
        *template.transform(),
        template.metadata().clone(),
    );
    for band in template.bands() {
        out = out.with_band(Band::new(band.name(), Grid::masked(rows, cols)))?;
    }
    Ok(out)
}

/// Per-pixel, per-band median of a non-empty set of images.
///
/// Band order follows the first image; all images must carry the same bands
/// and shape.
pub(crate) fn median_of(images: &[&Image]) -> Result<Image> {
    let template = *images
        .first()
        .ok_or(Error::EmptySequence("median composite"))?;
    check_uniform(images, template)?;

    let mut out = Image::new(
        template.shape(),
        *template.transform(),
        template.metadata().clone(),
    );
    for band in template.bands() {
        let grids: Vec<&Grid> = images
            .iter()
            .map(|img| img.require_band(band.name()))
            .collect::<Result<Vec<_>>>()?;
        out = out.with_band(Band::new(band.name(), median_grid(&grids, template.shape())?))?;
    }
    Ok(out)
}

/// Per-pixel median of a stack of grids, skipping masked values.
pub(crate) fn median_grid(grids: &[&Grid], shape: (usize, usize)) -> Result<Grid> {
    let (rows, cols) = shape;
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = Vec::with_capacity(grids.len());
            for (col, out) in row_data.iter_mut().enumerate() {
                values.clear();
                for grid in grids {
                    let v = unsafe { grid.get_unchecked(row, col) };
                    if !v.is_nan() {
                        values.push(v);
                    }
                }
                if !values.is_empty() {
                    *out = median_in_place(&mut values);
                }
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Grid::from_array(array))
}

/// Median of a non-empty slice; the midpoint of the two middle values for
/// even counts.
fn median_in_place(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

pub(crate) fn check_uniform(images: &[&Image], template: &Image) -> Result<()> {
    let (er, ec) = template.shape();
    for img in images {
        let (ar, ac) = img.shape();
        if (ar, ac) != (er, ec) {
            return Err(Error::ShapeMismatch { er, ec, ar, ac });
        }
    }
    Ok(())
}
