//! Multi-band image type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Grid};
use chrono::{DateTime, Utc};
use geo_types::Polygon;

/// A named band: one grid of per-pixel values.
#[derive(Debug, Clone)]
pub struct Band {
    name: String,
    grid: Grid,
}

impl Band {
    /// Create a new band
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }

    /// The band name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The band's pixel grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Consume the band, returning name and grid
    pub fn into_parts(self) -> (String, Grid) {
        (self.name, self.grid)
    }
}

/// Scalar metadata carried by every image.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    /// Acquisition instant
    pub acquired: DateTime<Utc>,
    /// Ground-coverage boundary in (longitude, latitude)
    pub footprint: Option<Polygon<f64>>,
    /// Number of source images contributing to a composite
    pub observations: Option<u32>,
}

impl ImageMetadata {
    /// Metadata with just an acquisition instant
    pub fn new(acquired: DateTime<Utc>) -> Self {
        Self {
            acquired,
            footprint: None,
            observations: None,
        }
    }

    /// Attach a footprint polygon
    pub fn with_footprint(mut self, footprint: Polygon<f64>) -> Self {
        self.footprint = Some(footprint);
        self
    }
}

/// An immutable multi-band grid with scalar metadata.
///
/// Bands are ordered, uniquely named and share one shape and one
/// [`GeoTransform`]. Transforms never mutate an image in place; they return a
/// new value.
#[derive(Debug, Clone)]
pub struct Image {
    bands: Vec<Band>,
    shape: (usize, usize),
    transform: GeoTransform,
    metadata: ImageMetadata,
}

impl Image {
    /// Create an image with no bands.
    ///
    /// The shape is fixed up front so that band-less images (e.g. the result
    /// of merging datasets with no common bands) still have dimensions.
    pub fn new(shape: (usize, usize), transform: GeoTransform, metadata: ImageMetadata) -> Self {
        Self {
            bands: Vec::new(),
            shape,
            transform,
            metadata,
        }
    }

    /// Create an image from a non-empty list of bands.
    ///
    /// The shape is taken from the first band; all bands must agree.
    pub fn from_bands(
        bands: Vec<Band>,
        transform: GeoTransform,
        metadata: ImageMetadata,
    ) -> Result<Self> {
        let first = bands
            .first()
            .ok_or(Error::Other("image requires at least one band".into()))?;
        let mut image = Image::new(first.grid().shape(), transform, metadata);
        for band in bands {
            image = image.with_band(band)?;
        }
        Ok(image)
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// The bands, in order
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Number of bands
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// Band names in order
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(Band::name).collect()
    }

    /// Whether a band with the given name exists
    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name() == name)
    }

    /// Get a band's grid by name
    pub fn band(&self, name: &str) -> Option<&Grid> {
        self.bands
            .iter()
            .find(|b| b.name() == name)
            .map(Band::grid)
    }

    /// Get a band's grid by name, or fail
    pub fn require_band(&self, name: &str) -> Result<&Grid> {
        self.band(name).ok_or_else(|| Error::BandNotFound {
            name: name.to_string(),
        })
    }

    /// The affine pixel-to-geographic transform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// The scalar metadata
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Acquisition instant
    pub fn acquired(&self) -> DateTime<Utc> {
        self.metadata.acquired
    }

    /// Footprint polygon, if present
    pub fn footprint(&self) -> Option<&Polygon<f64>> {
        self.metadata.footprint.as_ref()
    }

    /// Longitude/latitude of a pixel center
    pub fn lon_lat(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Append a band. Fails on a duplicate name or mismatched shape.
    pub fn with_band(mut self, band: Band) -> Result<Self> {
        if self.has_band(band.name()) {
            return Err(Error::DuplicateBand {
                name: band.name().to_string(),
            });
        }
        let (ar, ac) = band.grid().shape();
        let (er, ec) = self.shape;
        if (ar, ac) != (er, ec) {
            return Err(Error::ShapeMismatch { er, ec, ar, ac });
        }
        self.bands.push(band);
        Ok(self)
    }

    /// Append a band, replacing any existing band of the same name in place.
    ///
    /// Replacement keeps the band's position; appends otherwise.
    pub fn with_band_overwrite(mut self, band: Band) -> Result<Self> {
        let (ar, ac) = band.grid().shape();
        let (er, ec) = self.shape;
        if (ar, ac) != (er, ec) {
            return Err(Error::ShapeMismatch { er, ec, ar, ac });
        }
        match self.bands.iter().position(|b| b.name() == band.name()) {
            Some(i) => self.bands[i] = band,
            None => self.bands.push(band),
        }
        Ok(self)
    }

    /// Select a subset of bands, in the given order.
    ///
    /// An empty selection yields a band-less image of the same shape.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let mut bands = Vec::with_capacity(names.len());
        for name in names {
            let band = self
                .bands
                .iter()
                .find(|b| b.name() == *name)
                .ok_or_else(|| Error::BandNotFound {
                    name: name.to_string(),
                })?;
            bands.push(band.clone());
        }
        let mut out = Image::new(self.shape, self.transform, self.metadata.clone());
        for band in bands {
            out = out.with_band(band)?;
        }
        Ok(out)
    }

    /// Rename bands according to (from, to) pairs.
    ///
    /// Bands not mentioned keep their names; pixel values are untouched.
    /// Fails if a `from` name is absent or the result has duplicate names.
    pub fn renamed(&self, pairs: &[(&str, &str)]) -> Result<Self> {
        for (from, _) in pairs {
            if !self.has_band(from) {
                return Err(Error::BandNotFound {
                    name: from.to_string(),
                });
            }
        }
        let mut out = Image::new(self.shape, self.transform, self.metadata.clone());
        for band in &self.bands {
            let name = pairs
                .iter()
                .find(|(from, _)| *from == band.name())
                .map(|(_, to)| *to)
                .unwrap_or(band.name());
            out = out.with_band(Band::new(name, band.grid().clone()))?;
        }
        Ok(out)
    }

    /// Return the image with different metadata
    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Return the image tagged with an observation count
    pub fn with_observations(mut self, observations: u32) -> Self {
        self.metadata.observations = Some(observations);
        self
    }

    /// Return the image with a different acquisition instant
    pub fn with_acquired(mut self, acquired: DateTime<Utc>) -> Self {
        self.metadata.acquired = acquired;
        self
    }
}
