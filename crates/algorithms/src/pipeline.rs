//! Per-image transform pipelines
//!
//! A pipeline is an ordered list of immutable stage descriptions. Building
//! one computes nothing; `materialize` walks the stages against the in-memory
//! backend. Discarding an unmaterialized pipeline has no effects, and the
//! same description could be replayed against a chunked or distributed
//! backend.

use crate::brdf::{apply_brdf_correction, BrdfOptions};
use crate::sensor::{apply_qa_mask, apply_scaling, rename_common_bands, SensorSpec};
use crate::spectral::{
    add_date_band, add_day_of_year_band, add_fractional_year_band, compute_parsed,
    matrix_transform, SpectralIndex, TASSELED_CAP_BANDS,
};
use terralux_core::raster::{Image, ImageSequence};
use terralux_core::{Error, Result};

/// One per-image transform, described but not yet executed.
#[derive(Debug, Clone)]
pub enum ImageStage {
    /// Append the named spectral indices
    Indices(Vec<SpectralIndex>),
    /// Append the `date` band
    DateBand,
    /// Append the `doy` band
    DayOfYearBand,
    /// Append the `fYear` band
    FractionalYearBand,
    /// Mask pixels whose QA code is outside the allow-list
    QaMask {
        qa_band: String,
        valid_qa: Vec<f64>,
    },
    /// Multiply listed bands by their scaling factors
    Scaling { factors: Vec<(String, f64)> },
    /// Rename listed bands to their common names and drop the rest
    RenameCommonBands { renames: Vec<(String, String)> },
    /// Append the Tasseled Cap bands TC1..TC6
    TasseledCap { coefficients: [[f64; 6]; 6] },
    /// Normalize the common reflective bands to nadir reflectance
    BrdfCorrection { debug: bool },
}

impl ImageStage {
    /// An indices stage from catalog names; one bad name fails the call.
    pub fn indices(names: &[&str]) -> Result<Self> {
        let parsed = names
            .iter()
            .map(|name| {
                SpectralIndex::parse(name).ok_or_else(|| Error::UnknownSpectralIndex {
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ImageStage::Indices(parsed))
    }

    /// The QA masking stage of a sensor's preparation
    pub fn qa_mask(spec: &SensorSpec) -> Self {
        ImageStage::QaMask {
            qa_band: spec.qa_band.clone(),
            valid_qa: spec.valid_qa.clone(),
        }
    }

    /// The scaling stage of a sensor's preparation
    pub fn scaling(spec: &SensorSpec) -> Self {
        ImageStage::Scaling {
            factors: spec.scaling_factors(),
        }
    }

    /// The renaming stage of a sensor's preparation
    pub fn rename_common_bands(spec: &SensorSpec) -> Self {
        ImageStage::RenameCommonBands {
            renames: spec.rename_pairs(),
        }
    }

    /// A Tasseled Cap stage; fails if the sensor has no coefficients.
    pub fn tasseled_cap(spec: &SensorSpec) -> Result<Self> {
        let coefficients = spec
            .tasseled_cap
            .ok_or(Error::UnsupportedTransform("Tasseled Cap"))?;
        Ok(ImageStage::TasseledCap { coefficients })
    }

    /// Execute the stage on one image.
    pub fn apply(&self, image: &Image) -> Result<Image> {
        match self {
            ImageStage::Indices(indices) => compute_parsed(image, indices),
            ImageStage::DateBand => add_date_band(image),
            ImageStage::DayOfYearBand => add_day_of_year_band(image),
            ImageStage::FractionalYearBand => add_fractional_year_band(image),
            ImageStage::QaMask { qa_band, valid_qa } => {
                apply_qa_mask(image, qa_band, valid_qa)
            }
            ImageStage::Scaling { factors } => apply_scaling(image, factors),
            ImageStage::RenameCommonBands { renames } => rename_common_bands(image, renames),
            ImageStage::TasseledCap { coefficients } => {
                matrix_transform(image, coefficients, &TASSELED_CAP_BANDS)
            }
            ImageStage::BrdfCorrection { debug } => {
                apply_brdf_correction(image, &BrdfOptions { debug: *debug })
            }
        }
    }
}

/// An ordered, immutable list of [`ImageStage`]s.
#[derive(Debug, Clone, Default)]
pub struct ImagePipeline {
    stages: Vec<ImageStage>,
}

impl ImagePipeline {
    /// An empty pipeline (the identity transform)
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pipeline with a stage appended
    pub fn then(mut self, stage: ImageStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// The stage descriptions, in execution order
    pub fn stages(&self) -> &[ImageStage] {
        &self.stages
    }

    /// Execute every stage, in order, on one image.
    pub fn materialize(&self, image: &Image) -> Result<Image> {
        let mut current = image.clone();
        for stage in &self.stages {
            current = stage.apply(&current)?;
        }
        Ok(current)
    }

    /// Execute every stage, in order, on every image of a sequence.
    pub fn materialize_sequence(&self, sequence: &ImageSequence) -> Result<ImageSequence> {
        let images = sequence
            .iter()
            .map(|image| self.materialize(image))
            .collect::<Result<Vec<_>>>()?;
        Ok(ImageSequence::new(images))
    }
}
