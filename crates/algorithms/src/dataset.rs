//! Dataset: an image sequence with a tracked band catalog
//!
//! The band catalog is the list of band names a dataset asserts its sequence
//! currently has. Every transform that adds, renames or drops bands updates
//! the catalog in lock-step, so it always equals the actual band list of
//! every image in the sequence.

use crate::brdf::{apply_brdf_correction, BrdfOptions};
use crate::compositing::{
    create_medoid_composite, create_temporal_composites, CompositeConfig, Reducer,
};
use crate::spectral::{
    add_date_band, add_day_of_year_band, add_fractional_year_band, compute_parsed,
    SpectralIndex, DATE_BAND, DOY_BAND, FRACTIONAL_YEAR_BAND,
};
use chrono::{DateTime, Utc};
use geo::Intersects;
use geo_types::Polygon;
use terralux_core::raster::{Image, ImageSequence};
use terralux_core::{Error, Result};

/// An ordered collection of images plus its band catalog.
#[derive(Debug, Clone)]
pub struct Dataset {
    sequence: ImageSequence,
    catalog: Vec<String>,
}

impl Dataset {
    /// Create a dataset, deriving the catalog from the first image.
    ///
    /// Every image must carry the same band list; an empty sequence yields an
    /// empty catalog.
    pub fn new(sequence: ImageSequence) -> Result<Self> {
        let catalog = sequence
            .first()
            .map(|img| img.band_names().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        Self::from_parts(sequence, catalog)
    }

    /// Create a dataset from a sequence and an explicit catalog.
    ///
    /// Fails unless the catalog matches the band list of every image.
    pub fn from_parts(sequence: ImageSequence, catalog: Vec<String>) -> Result<Self> {
        for image in &sequence {
            let names = image.band_names();
            if names != catalog.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(Error::Other(format!(
                    "band catalog {:?} does not match image bands {:?}",
                    catalog, names
                )));
            }
        }
        Ok(Self { sequence, catalog })
    }

    /// The underlying image sequence
    pub fn sequence(&self) -> &ImageSequence {
        &self.sequence
    }

    /// The band catalog, in band order
    pub fn band_catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Keep only images matching a predicate. The catalog is unchanged.
    pub fn filter<F>(&self, pred: F) -> Self
    where
        F: Fn(&Image) -> bool,
    {
        Self {
            sequence: self.sequence.filter(pred),
            catalog: self.catalog.clone(),
        }
    }

    /// Keep only images acquired in `[start, end)`. The catalog is unchanged.
    pub fn filter_date(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            sequence: self.sequence.filter_date(start, end),
            catalog: self.catalog.clone(),
        }
    }

    /// Keep only images whose footprint intersects the given geometry.
    ///
    /// Images without a footprint are excluded. The catalog is unchanged.
    pub fn filter_bounds(&self, geometry: &Polygon<f64>) -> Self {
        self.filter(|img| {
            img.footprint()
                .is_some_and(|footprint| footprint.intersects(geometry))
        })
    }

    /// Compute spectral indices over every image, appending them as bands.
    ///
    /// Index names are validated against the catalog of known indices before
    /// anything is computed; one bad name fails the whole call.
    pub fn add_band_indices(&self, names: &[&str]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                SpectralIndex::parse(name).ok_or_else(|| Error::UnknownSpectralIndex {
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!("adding spectral indices {:?} to {} images", names, self.sequence.len());

        self.map_images(
            |img| compute_parsed(img, &indices),
            names.iter().map(|n| n.to_string()).collect(),
        )
    }

    /// Append a `date` band (ms since epoch) to every image
    pub fn add_date_band(&self) -> Result<Self> {
        self.map_images(add_date_band, vec![DATE_BAND.to_string()])
    }

    /// Append a `doy` band (0-based day of year) to every image
    pub fn add_day_of_year_band(&self) -> Result<Self> {
        self.map_images(add_day_of_year_band, vec![DOY_BAND.to_string()])
    }

    /// Append an `fYear` band (fractional year) to every image
    pub fn add_fractional_year_band(&self) -> Result<Self> {
        self.map_images(add_fractional_year_band, vec![FRACTIONAL_YEAR_BAND.to_string()])
    }

    /// Normalize the common reflective bands of every image to nadir
    /// reflectance. Band membership is unchanged, so the catalog stays as is.
    pub fn apply_brdf_correction(&self) -> Result<Self> {
        let options = BrdfOptions::default();
        self.map_images(|img| apply_brdf_correction(img, &options), Vec::new())
    }

    /// Merge with another dataset on their common bands.
    ///
    /// The common bands are the set intersection, ordered by this dataset's
    /// catalog; both sequences are restricted to them (other bands dropped)
    /// and concatenated, this one first. No common bands is not an error: the
    /// result is a valid dataset with an empty catalog.
    pub fn merge(&self, other: &Dataset) -> Result<Self> {
        let common: Vec<String> = self
            .catalog
            .iter()
            .filter(|band| other.catalog.contains(band))
            .cloned()
            .collect();
        let names: Vec<&str> = common.iter().map(String::as_str).collect();
        log::debug!(
            "merging {}+{} images on {} common bands",
            self.sequence.len(),
            other.sequence.len(),
            common.len()
        );

        let mut images = Vec::with_capacity(self.sequence.len() + other.sequence.len());
        for image in self.sequence.iter().chain(other.sequence.iter()) {
            images.push(image.select(&names)?);
        }
        Ok(Self {
            sequence: ImageSequence::new(images),
            catalog: common,
        })
    }

    /// Reduce the sequence into fixed-window composites.
    ///
    /// See [`create_temporal_composites`]. The composites carry the same
    /// bands, so the catalog is unchanged.
    pub fn create_temporal_composites(
        &self,
        config: &CompositeConfig,
        reducer: &Reducer,
    ) -> Result<Self> {
        let composites = create_temporal_composites(&self.sequence, config, reducer)?;
        Self::from_parts(composites, self.catalog.clone())
    }

    /// Reduce the whole sequence to a single medoid composite.
    ///
    /// See [`create_medoid_composite`]. The result is a one-image dataset
    /// with an unchanged catalog.
    pub fn create_medoid_composite(&self, bands: &[&str]) -> Result<Self> {
        let composite = create_medoid_composite(&self.sequence, bands)?;
        Self::from_parts(ImageSequence::new(vec![composite]), self.catalog.clone())
    }

    fn map_images<F>(&self, f: F, appended: Vec<String>) -> Result<Self>
    where
        F: Fn(&Image) -> Result<Image>,
    {
        let images = self
            .sequence
            .iter()
            .map(&f)
            .collect::<Result<Vec<_>>>()?;
        let mut catalog = self.catalog.clone();
        catalog.extend(appended);
        Self::from_parts(ImageSequence::new(images), catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geo_types::polygon;
    use terralux_core::raster::{Band, GeoTransform, Grid, ImageMetadata};

    fn image_with(day: u32, bands: &[(&str, f64)]) -> Image {
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, day, 0, 0, 0).unwrap());
        let mut img = Image::new((2, 2), GeoTransform::default(), meta);
        for (name, value) in bands {
            img = img
                .with_band(Band::new(*name, Grid::filled(2, 2, *value)))
                .unwrap();
        }
        img
    }

    #[test]
    fn test_catalog_derived_from_sequence() {
        let seq = ImageSequence::new(vec![image_with(1, &[("nir", 0.5), ("red", 0.2)])]);
        let ds = Dataset::new(seq).unwrap();
        assert_eq!(ds.band_catalog(), &["nir", "red"]);
    }

    #[test]
    fn test_mismatched_bands_rejected() {
        let seq = ImageSequence::new(vec![
            image_with(1, &[("nir", 0.5)]),
            image_with(2, &[("red", 0.2)]),
        ]);
        assert!(Dataset::new(seq).is_err());
    }

    #[test]
    fn test_filter_date_keeps_catalog() {
        let seq = ImageSequence::new(vec![
            image_with(1, &[("nir", 0.5)]),
            image_with(20, &[("nir", 0.7)]),
        ]);
        let ds = Dataset::new(seq).unwrap();
        let filtered = ds.filter_date(
            Utc.with_ymd_and_hms(2020, 6, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 7, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(filtered.sequence().len(), 1);
        assert_eq!(filtered.band_catalog(), &["nir"]);
    }

    #[test]
    fn test_filter_bounds() {
        let footprint = polygon![
            (x: 10.0, y: 40.0), (x: 11.0, y: 40.0), (x: 11.0, y: 41.0), (x: 10.0, y: 41.0),
        ];
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap())
            .with_footprint(footprint);
        let with_fp = Image::new((2, 2), GeoTransform::default(), meta)
            .with_band(Band::new("nir", Grid::filled(2, 2, 0.5)))
            .unwrap();
        let without_fp = image_with(2, &[("nir", 0.6)]);

        let ds = Dataset::new(ImageSequence::new(vec![with_fp, without_fp])).unwrap();

        let inside = polygon![
            (x: 10.4, y: 40.4), (x: 10.6, y: 40.4), (x: 10.6, y: 40.6), (x: 10.4, y: 40.6),
        ];
        let far_away = polygon![
            (x: 50.0, y: 0.0), (x: 51.0, y: 0.0), (x: 51.0, y: 1.0), (x: 50.0, y: 1.0),
        ];

        // The footprint-less image never matches.
        assert_eq!(ds.filter_bounds(&inside).sequence().len(), 1);
        assert_eq!(ds.filter_bounds(&far_away).sequence().len(), 0);
    }

    #[test]
    fn test_add_band_indices_updates_catalog() {
        let seq = ImageSequence::new(vec![image_with(1, &[("nir", 5000.0), ("red", 4000.0)])]);
        let ds = Dataset::new(seq).unwrap().add_band_indices(&["ndvi"]).unwrap();

        assert_eq!(ds.band_catalog(), &["nir", "red", "ndvi"]);
        let v = ds.sequence().first().unwrap().band("ndvi").unwrap().get(0, 0).unwrap();
        assert!((v - 1.0 / 9.0).abs() < 1e-15);
    }

    #[test]
    fn test_add_band_indices_bad_name_rejected() {
        let seq = ImageSequence::new(vec![image_with(1, &[("nir", 0.5), ("red", 0.2)])]);
        let ds = Dataset::new(seq).unwrap();
        let result = ds.add_band_indices(&["ndvi", "nope"]);
        assert!(matches!(result, Err(Error::UnknownSpectralIndex { .. })));
    }

    #[test]
    fn test_merge_common_bands() {
        let left = Dataset::new(ImageSequence::new(vec![image_with(
            1,
            &[("a", 1.0), ("b", 2.0), ("c", 3.0)],
        )]))
        .unwrap();
        let right = Dataset::new(ImageSequence::new(vec![
            image_with(2, &[("b", 4.0), ("c", 5.0), ("d", 6.0)]),
            image_with(3, &[("b", 7.0), ("c", 8.0), ("d", 9.0)]),
        ]))
        .unwrap();

        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.sequence().len(), 3);
        assert_eq!(merged.band_catalog(), &["b", "c"]);
        for image in merged.sequence() {
            assert_eq!(image.band_names(), vec!["b", "c"]);
        }
        // Order is stable: self's images first.
        let first = merged.sequence().first().unwrap();
        assert_eq!(first.band("b").unwrap().get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_merge_no_common_bands_is_degenerate_not_error() {
        let left = Dataset::new(ImageSequence::new(vec![image_with(1, &[("a", 1.0)])])).unwrap();
        let right = Dataset::new(ImageSequence::new(vec![image_with(2, &[("b", 2.0)])])).unwrap();

        let merged = left.merge(&right).unwrap();
        assert!(merged.band_catalog().is_empty());
        assert_eq!(merged.sequence().len(), 2);
        assert_eq!(merged.sequence().first().unwrap().num_bands(), 0);
    }

    #[test]
    fn test_date_band_wrappers_update_catalog() {
        let seq = ImageSequence::new(vec![image_with(1, &[("nir", 0.5)])]);
        let ds = Dataset::new(seq)
            .unwrap()
            .add_date_band()
            .unwrap()
            .add_day_of_year_band()
            .unwrap()
            .add_fractional_year_band()
            .unwrap();
        assert_eq!(ds.band_catalog(), &["nir", "date", "doy", "fYear"]);
    }
}
