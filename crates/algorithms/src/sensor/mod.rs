//! Sensor-specific preprocessing
//!
//! Each sensor declares an allow-list of valid QA codes, a table linking raw
//! band names to their common names and scaling factors, and optional
//! Tasseled Cap coefficients. The individual masking, scaling and renaming
//! operations are exposed, but the expected usage is `prepare()`, which runs
//! the recommended preparation in fixed order.

mod landsat;

pub use landsat::{landsat5, landsat7, landsat8};

use crate::dataset::Dataset;
use crate::maybe_rayon::*;
use crate::pipeline::{ImagePipeline, ImageStage};
use crate::spectral::{matrix_transform, TASSELED_CAP_BANDS};
use chrono::{DateTime, Utc};
use geo_types::Polygon;
use ndarray::Array2;
use terralux_core::raster::{Band, Grid, Image, ImageSequence};
use terralux_core::{Error, Result};

/// One entry of a sensor's band table: a raw band, its common name, and the
/// factor converting stored values to physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonBand {
    /// Raw band name as delivered by the sensor
    pub raw: String,
    /// Canonical name after preparation
    pub common: String,
    /// Multiplicative scaling factor
    pub scaling: f64,
}

impl CommonBand {
    pub fn new(raw: impl Into<String>, common: impl Into<String>, scaling: f64) -> Self {
        Self {
            raw: raw.into(),
            common: common.into(),
            scaling,
        }
    }
}

/// Sensor-specific configuration for dataset preparation.
///
/// Values are supplied by the caller; presets for the Landsat family are in
/// [`landsat5`], [`landsat7`] and [`landsat8`].
#[derive(Debug, Clone)]
pub struct SensorSpec {
    /// Human-readable sensor name
    pub name: String,
    /// Name of the per-pixel QA band
    pub qa_band: String,
    /// QA codes marking pixels to keep; everything else is masked
    pub valid_qa: Vec<f64>,
    /// All raw bands, in their expected order
    pub bands: Vec<String>,
    /// Raw-to-common band table with scaling factors
    pub common_bands: Vec<CommonBand>,
    /// Tasseled Cap coefficient rows over {blue, green, red, nir, swir1,
    /// swir2}, if published for this sensor
    pub tasseled_cap: Option<[[f64; 6]; 6]>,
}

impl SensorSpec {
    /// Look up a band-table entry by raw name
    pub fn common_band(&self, raw: &str) -> Option<&CommonBand> {
        self.common_bands.iter().find(|cb| cb.raw == raw)
    }

    /// (raw, scaling) pairs for every band in the table
    pub fn scaling_factors(&self) -> Vec<(String, f64)> {
        self.common_bands
            .iter()
            .map(|cb| (cb.raw.clone(), cb.scaling))
            .collect()
    }

    /// (raw, common) pairs for the declared bands present in the table, in
    /// declared band order
    pub fn rename_pairs(&self) -> Vec<(String, String)> {
        self.bands
            .iter()
            .filter_map(|raw| {
                self.common_band(raw)
                    .map(|cb| (cb.raw.clone(), cb.common.clone()))
            })
            .collect()
    }
}

/// Mask every pixel whose QA value is not in the allow-list.
///
/// All bands, the QA band included, are set to NaN wherever the QA band's
/// value is not exactly one of `valid_qa`.
pub fn apply_qa_mask(image: &Image, qa_band: &str, valid_qa: &[f64]) -> Result<Image> {
    let qa = image.require_band(qa_band)?;
    let (rows, cols) = image.shape();

    let keep: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_keep = vec![false; cols];
            for (col, keep) in row_keep.iter_mut().enumerate() {
                let code = unsafe { qa.get_unchecked(row, col) };
                *keep = valid_qa.iter().any(|&valid| code == valid);
            }
            row_keep
        })
        .collect();

    let mut out = Image::new(image.shape(), *image.transform(), image.metadata().clone());
    for band in image.bands() {
        let grid = band.grid();
        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                for (col, out) in row_data.iter_mut().enumerate() {
                    if keep[row * cols + col] {
                        *out = unsafe { grid.get_unchecked(row, col) };
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

/// Multiply each listed band by its scaling factor, in place by name.
///
/// Bands without a declared factor are untouched.
pub fn apply_scaling(image: &Image, factors: &[(String, f64)]) -> Result<Image> {
    let mut out = image.clone();
    for (raw, factor) in factors {
        let grid = image.require_band(raw)?;
        out = out.with_band_overwrite(Band::new(raw.clone(), grid.map(|v| v * factor)))?;
    }
    Ok(out)
}

/// Rename the listed bands to their common names and drop the rest.
///
/// Kept bands stay in their original relative order; pixel values are
/// untouched.
pub fn rename_common_bands(image: &Image, pairs: &[(String, String)]) -> Result<Image> {
    let raw: Vec<&str> = pairs.iter().map(|(from, _)| from.as_str()).collect();
    let renames: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();
    image.select(&raw)?.renamed(&renames)
}

/// A Landsat-family dataset: a [`Dataset`] plus its [`SensorSpec`].
///
/// Holds the dataset by composition and exposes its operations by
/// delegation.
#[derive(Debug, Clone)]
pub struct Landsat {
    dataset: Dataset,
    spec: SensorSpec,
}

impl Landsat {
    /// Wrap an existing dataset with a sensor configuration
    pub fn new(dataset: Dataset, spec: SensorSpec) -> Self {
        Self { dataset, spec }
    }

    /// Build a dataset from a raw image sequence and a sensor configuration
    pub fn from_sequence(sequence: ImageSequence, spec: SensorSpec) -> Result<Self> {
        Ok(Self {
            dataset: Dataset::new(sequence)?,
            spec,
        })
    }

    /// The wrapped dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The sensor configuration
    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    /// Unwrap into the prepared dataset
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Run the recommended preparation: QA masking, scaling, renaming.
    pub fn prepare(self) -> Result<Self> {
        log::debug!("preparing {} dataset", self.spec.name);
        let pipeline = ImagePipeline::new()
            .then(ImageStage::qa_mask(&self.spec))
            .then(ImageStage::scaling(&self.spec))
            .then(ImageStage::rename_common_bands(&self.spec));
        let sequence = pipeline.materialize_sequence(self.dataset.sequence())?;
        let catalog = self
            .spec
            .rename_pairs()
            .into_iter()
            .map(|(_, common)| common)
            .collect();
        Ok(Self {
            dataset: Dataset::from_parts(sequence, catalog)?,
            spec: self.spec,
        })
    }

    /// Mask pixels whose QA code is not in the sensor's allow-list
    pub fn apply_qa_mask(self) -> Result<Self> {
        let stage = ImageStage::qa_mask(&self.spec);
        self.map_stage(stage, None)
    }

    /// Apply the sensor's band scaling factors
    pub fn apply_scaling(self) -> Result<Self> {
        let stage = ImageStage::scaling(&self.spec);
        self.map_stage(stage, None)
    }

    /// Rename to common band names, dropping bands outside the table.
    ///
    /// The band catalog is overwritten with the final canonical names.
    pub fn rename_common_bands(self) -> Result<Self> {
        let catalog: Vec<String> = self
            .spec
            .rename_pairs()
            .into_iter()
            .map(|(_, common)| common)
            .collect();
        let stage = ImageStage::rename_common_bands(&self.spec);
        self.map_stage(stage, Some(catalog))
    }

    /// Append the Tasseled Cap bands TC1..TC6.
    ///
    /// Fails with an unsupported-transform error if the sensor has no
    /// published coefficients.
    pub fn add_tasseled_cap(self) -> Result<Self> {
        let coef = self
            .spec
            .tasseled_cap
            .ok_or(Error::UnsupportedTransform("Tasseled Cap"))?;
        let images = self
            .dataset
            .sequence()
            .iter()
            .map(|img| matrix_transform(img, &coef, &TASSELED_CAP_BANDS))
            .collect::<Result<Vec<_>>>()?;
        let mut catalog: Vec<String> = self.dataset.band_catalog().to_vec();
        catalog.extend(TASSELED_CAP_BANDS.iter().map(|s| s.to_string()));
        Ok(Self {
            dataset: Dataset::from_parts(ImageSequence::new(images), catalog)?,
            spec: self.spec,
        })
    }

    /// See [`Dataset::filter_date`]
    pub fn filter_date(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            dataset: self.dataset.filter_date(start, end),
            spec: self.spec,
        }
    }

    /// See [`Dataset::filter_bounds`]
    pub fn filter_bounds(self, geometry: &Polygon<f64>) -> Self {
        Self {
            dataset: self.dataset.filter_bounds(geometry),
            spec: self.spec,
        }
    }

    /// See [`Dataset::add_band_indices`]
    pub fn add_band_indices(self, names: &[&str]) -> Result<Self> {
        Ok(Self {
            dataset: self.dataset.add_band_indices(names)?,
            spec: self.spec,
        })
    }

    /// See [`Dataset::apply_brdf_correction`]
    pub fn apply_brdf_correction(self) -> Result<Self> {
        Ok(Self {
            dataset: self.dataset.apply_brdf_correction()?,
            spec: self.spec,
        })
    }

    fn map_stage(self, stage: ImageStage, catalog: Option<Vec<String>>) -> Result<Self> {
        let images = self
            .dataset
            .sequence()
            .iter()
            .map(|img| stage.apply(img))
            .collect::<Result<Vec<_>>>()?;
        let catalog = catalog.unwrap_or_else(|| self.dataset.band_catalog().to_vec());
        Ok(Self {
            dataset: Dataset::from_parts(ImageSequence::new(images), catalog)?,
            spec: self.spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use terralux_core::raster::{GeoTransform, ImageMetadata};

    fn spec() -> SensorSpec {
        SensorSpec {
            name: "test sensor".into(),
            qa_band: "pixel_qa".into(),
            valid_qa: vec![66.0, 130.0],
            bands: vec!["B1".into(), "B2".into(), "B3".into()],
            common_bands: vec![
                CommonBand::new("B1", "blue", 0.0001),
                CommonBand::new("B3", "red", 0.1),
            ],
            tasseled_cap: None,
        }
    }

    fn raw_image(qa: &[f64]) -> Image {
        let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());
        let rows = 2;
        let cols = 2;
        Image::new((rows, cols), GeoTransform::default(), meta)
            .with_band(Band::new("B1", Grid::filled(rows, cols, 4000.0)))
            .unwrap()
            .with_band(Band::new("B2", Grid::filled(rows, cols, 5000.0)))
            .unwrap()
            .with_band(Band::new("B3", Grid::filled(rows, cols, 60.0)))
            .unwrap()
            .with_band(Band::new(
                "pixel_qa",
                Grid::from_vec(qa.to_vec(), rows, cols).unwrap(),
            ))
            .unwrap()
    }

    #[test]
    fn test_qa_mask_is_exact_allow_list() {
        let img = raw_image(&[66.0, 67.0, 130.0, 0.0]);
        let masked = apply_qa_mask(&img, "pixel_qa", &[66.0, 130.0]).unwrap();

        let b1 = masked.band("B1").unwrap();
        assert_eq!(b1.get(0, 0).unwrap(), 4000.0, "QA 66 kept");
        assert!(b1.get(0, 1).unwrap().is_nan(), "QA 67 masked");
        assert_eq!(b1.get(1, 0).unwrap(), 4000.0, "QA 130 kept");
        assert!(b1.get(1, 1).unwrap().is_nan(), "QA 0 masked");
    }

    #[test]
    fn test_scaling_roundtrip() {
        let img = raw_image(&[66.0; 4]);
        let scaled = apply_scaling(&img, &spec().scaling_factors()).unwrap();

        let b1 = scaled.band("B1").unwrap().get(0, 0).unwrap();
        assert!((b1 - 0.4).abs() < 1e-12);
        // Dividing by the factor restores the original exactly.
        assert_eq!(b1 / 0.0001 / 4000.0, 1.0);
        // Unlisted bands untouched.
        assert_eq!(scaled.band("B2").unwrap().get(0, 0).unwrap(), 5000.0);
    }

    #[test]
    fn test_rename_drops_and_orders() {
        let img = raw_image(&[66.0; 4]);
        let renamed = rename_common_bands(&img, &spec().rename_pairs()).unwrap();

        assert_eq!(renamed.band_names(), vec!["blue", "red"]);
        assert!(renamed.band("B2").is_none(), "unlisted band dropped");
        assert!(renamed.band("pixel_qa").is_none(), "QA band dropped");
        // Values untouched.
        assert_eq!(renamed.band("blue").unwrap().get(0, 0).unwrap(), 4000.0);
    }

    #[test]
    fn test_prepare_runs_in_fixed_order() {
        let seq = ImageSequence::new(vec![raw_image(&[66.0, 0.0, 66.0, 66.0])]);
        let prepared = Landsat::from_sequence(seq, spec()).unwrap().prepare().unwrap();

        assert_eq!(prepared.dataset().band_catalog(), &["blue", "red"]);
        let image = prepared.dataset().sequence().first().unwrap();
        // Masked first, then scaled, then renamed.
        assert!((image.band("blue").unwrap().get(0, 0).unwrap() - 0.4).abs() < 1e-12);
        assert!(image.band("blue").unwrap().get(0, 1).unwrap().is_nan());
        assert!((image.band("red").unwrap().get(1, 0).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_tasseled_cap_without_coefficients_fails() {
        let seq = ImageSequence::new(vec![raw_image(&[66.0; 4])]);
        let result = Landsat::from_sequence(seq, spec()).unwrap().add_tasseled_cap();
        assert!(matches!(result, Err(Error::UnsupportedTransform(_))));
    }
}
