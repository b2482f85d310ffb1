//! End-to-end pipeline tests over synthetic Landsat scenes.
//!
//! These tests exercise the full preparation chain the way a caller would:
//! raw digital numbers in, QA masking, scaling and renaming, spectral
//! indices, compositing and BRDF normalization out. All scenes are small
//! synthetic grids, so no fixtures are required.

use chrono::{TimeZone, Utc};
use geo_types::{polygon, Polygon};
use terralux_algorithms::brdf::{apply_brdf_correction, BrdfOptions};
use terralux_algorithms::compositing::{
    create_medoid_reducer, CompositeConfig, IntervalUnit, Reducer,
};
use terralux_algorithms::sensor::{landsat7, landsat8, Landsat};
use terralux_core::raster::{Band, GeoTransform, Grid, Image, ImageMetadata, ImageSequence};

const ROWS: usize = 4;
const COLS: usize = 4;

fn footprint() -> Polygon<f64> {
    polygon![
        (x: 10.0, y: 40.0),
        (x: 12.0, y: 40.0),
        (x: 12.0, y: 42.0),
        (x: 10.0, y: 42.0),
    ]
}

fn transform() -> GeoTransform {
    GeoTransform::new(10.0, 42.0, 0.5, -0.5)
}

/// A raw Landsat 8 SR scene: digital numbers scaled by 1e4 (reflective) and
/// 10 (thermal), all pixels clear (QA 322).
fn l8_scene(day: u32, red_dn: f64, nir_dn: f64) -> Image {
    let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, day, 10, 30, 0).unwrap())
        .with_footprint(footprint());
    let mut img = Image::new((ROWS, COLS), transform(), meta);
    let bands = [
        ("B1", 1500.0),
        ("B2", 1800.0),
        ("B3", 2200.0),
        ("B4", red_dn),
        ("B5", nir_dn),
        ("B6", 1600.0),
        ("B7", 1100.0),
        ("B10", 2900.0),
        ("B11", 2850.0),
        ("pixel_qa", 322.0),
    ];
    for (name, value) in bands {
        img = img
            .with_band(Band::new(name, Grid::filled(ROWS, COLS, value)))
            .unwrap();
    }
    img
}

/// A raw Landsat 7 SR scene, all pixels clear (QA 66).
fn l7_scene(day: u32) -> Image {
    let meta = ImageMetadata::new(Utc.with_ymd_and_hms(2020, 6, day, 10, 0, 0).unwrap())
        .with_footprint(footprint());
    let mut img = Image::new((ROWS, COLS), transform(), meta);
    let bands = [
        ("B1", 1700.0),
        ("B2", 2100.0),
        ("B3", 2400.0),
        ("B4", 3600.0),
        ("B5", 2500.0),
        ("B6", 2870.0),
        ("B7", 1300.0),
        ("pixel_qa", 66.0),
    ];
    for (name, value) in bands {
        img = img
            .with_band(Band::new(name, Grid::filled(ROWS, COLS, value)))
            .unwrap();
    }
    img
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

#[test]
fn prepare_masks_scales_and_renames() {
    let seq = ImageSequence::new(vec![l8_scene(1, 2000.0, 3000.0)]);
    let prepared = Landsat::from_sequence(seq, landsat8())
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        prepared.dataset().band_catalog(),
        &[
            "coastal", "blue", "green", "red", "nir", "swir1", "swir2", "thermal1", "thermal2"
        ]
    );

    let image = prepared.dataset().sequence().first().unwrap();
    assert_eq!(image.band_names(), prepared.dataset().band_catalog());
    // 2000 DN * 1e-4 = 0.2 reflectance; 2900 DN * 0.1 = 290 K.
    assert!((image.band("red").unwrap().get(0, 0).unwrap() - 0.2).abs() < 1e-12);
    assert!((image.band("thermal1").unwrap().get(0, 0).unwrap() - 290.0).abs() < 1e-12);
    assert!(!image.has_band("pixel_qa"), "QA band dropped after rename");
}

#[test]
fn cloudy_pixels_are_masked_through_prepare() {
    let mut qa = Grid::filled(ROWS, COLS, 322.0);
    qa.set(0, 0, 352.0).unwrap(); // cloud
    let raw = l8_scene(1, 2000.0, 3000.0)
        .with_band_overwrite(Band::new("pixel_qa", qa))
        .unwrap();

    let prepared = Landsat::from_sequence(ImageSequence::new(vec![raw]), landsat8())
        .unwrap()
        .prepare()
        .unwrap();

    let red = prepared
        .dataset()
        .sequence()
        .first()
        .unwrap()
        .band("red")
        .unwrap()
        .clone();
    assert!(red.get(0, 0).unwrap().is_nan(), "cloudy pixel masked");
    assert!((red.get(1, 1).unwrap() - 0.2).abs() < 1e-12, "clear pixel kept");
}

// ---------------------------------------------------------------------------
// Indices and compositing
// ---------------------------------------------------------------------------

#[test]
fn indices_and_temporal_composites() {
    let seq = ImageSequence::new(vec![
        l8_scene(1, 2000.0, 3000.0),
        l8_scene(11, 2000.0, 4000.0),
        l8_scene(21, 2000.0, 8000.0),
    ]);
    let dataset = Landsat::from_sequence(seq, landsat8())
        .unwrap()
        .prepare()
        .unwrap()
        .add_band_indices(&["ndvi", "nbr"])
        .unwrap()
        .into_dataset();

    assert!(dataset.band_catalog().ends_with(&["ndvi".into(), "nbr".into()]));

    let config = CompositeConfig {
        start: Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(),
        count: 1,
        interval: 1,
        unit: IntervalUnit::Months,
    };
    let composites = dataset
        .create_temporal_composites(&config, &Reducer::Median)
        .unwrap();

    let composite = composites.sequence().first().unwrap();
    assert_eq!(composite.metadata().observations, Some(3));
    // Median nir across 0.3, 0.4, 0.8.
    assert!((composite.band("nir").unwrap().get(2, 2).unwrap() - 0.4).abs() < 1e-12);
    // ndvi of the middle scene: (0.4 - 0.2) / 0.6.
    let ndvi = composite.band("ndvi").unwrap().get(2, 2).unwrap();
    assert!((ndvi - 0.2 / 0.6).abs() < 1e-12, "got {}", ndvi);
}

#[test]
fn windowed_medoid_returns_complete_observations() {
    let seq = ImageSequence::new(vec![
        l8_scene(1, 2000.0, 3000.0),
        l8_scene(11, 2000.0, 4000.0),
        l8_scene(21, 2000.0, 8000.0),
    ]);
    let dataset = Landsat::from_sequence(seq, landsat8())
        .unwrap()
        .prepare()
        .unwrap()
        .add_band_indices(&["ndvi"])
        .unwrap()
        .into_dataset();

    let config = CompositeConfig {
        start: Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(),
        count: 1,
        interval: 1,
        unit: IntervalUnit::Months,
    };
    let composites = dataset
        .create_temporal_composites(&config, &create_medoid_reducer(&["ndvi"]))
        .unwrap();

    // The June 11 scene's ndvi is the median, so the whole observation wins:
    // its nir must come along with its ndvi.
    let composite = composites.sequence().first().unwrap();
    assert!((composite.band("nir").unwrap().get(0, 0).unwrap() - 0.4).abs() < 1e-12);
    assert_eq!(composite.metadata().observations, Some(3));
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

#[test]
fn merged_sensors_share_reflective_bands() {
    let l8 = Landsat::from_sequence(
        ImageSequence::new(vec![l8_scene(1, 2000.0, 3000.0)]),
        landsat8(),
    )
    .unwrap()
    .prepare()
    .unwrap()
    .into_dataset();
    let l7 = Landsat::from_sequence(
        ImageSequence::new(vec![l7_scene(5), l7_scene(15)]),
        landsat7(),
    )
    .unwrap()
    .prepare()
    .unwrap()
    .into_dataset();

    let merged = l8.merge(&l7).unwrap();
    // L8 order restricted to the bands L7 also has.
    assert_eq!(
        merged.band_catalog(),
        &["blue", "green", "red", "nir", "swir1", "swir2"]
    );
    assert_eq!(merged.sequence().len(), 3);
    for image in merged.sequence() {
        assert_eq!(image.band_names(), merged.band_catalog());
    }
}

// ---------------------------------------------------------------------------
// Tasseled Cap and BRDF
// ---------------------------------------------------------------------------

#[test]
fn tasseled_cap_appends_six_components() {
    let seq = ImageSequence::new(vec![l8_scene(1, 2000.0, 3000.0)]);
    let dataset = Landsat::from_sequence(seq, landsat8())
        .unwrap()
        .prepare()
        .unwrap()
        .add_tasseled_cap()
        .unwrap()
        .into_dataset();

    assert!(dataset
        .band_catalog()
        .ends_with(&["TC1".into(), "TC2".into(), "TC3".into(), "TC4".into(), "TC5".into(), "TC6".into()]));

    // Brightness is a positive combination of positive reflectances.
    let image = dataset.sequence().first().unwrap();
    let brightness = image.band("TC1").unwrap().get(1, 1).unwrap();
    assert!(brightness > 0.0, "got {}", brightness);
}

#[test]
fn brdf_correction_preserves_catalog_and_metadata() {
    let seq = ImageSequence::new(vec![l8_scene(10, 2000.0, 3000.0)]);
    let prepared = Landsat::from_sequence(seq, landsat8())
        .unwrap()
        .prepare()
        .unwrap();
    let catalog_before: Vec<String> = prepared.dataset().band_catalog().to_vec();

    let corrected = prepared.apply_brdf_correction().unwrap().into_dataset();
    assert_eq!(corrected.band_catalog(), &catalog_before[..]);

    let image = corrected.sequence().first().unwrap();
    assert_eq!(
        image.acquired(),
        Utc.with_ymd_and_hms(2020, 6, 10, 10, 30, 0).unwrap()
    );
    // Reflective bands were rescaled by a finite factor.
    let nir = image.band("nir").unwrap().get(2, 2).unwrap();
    assert!(nir.is_finite() && nir > 0.0);
    // Thermal bands pass through untouched.
    assert!((image.band("thermal1").unwrap().get(2, 2).unwrap() - 290.0).abs() < 1e-12);
}

#[test]
fn brdf_debug_mode_keeps_correction_consistent() {
    let scene = l8_scene(10, 2000.0, 3000.0);
    let prepared = Landsat::from_sequence(ImageSequence::new(vec![scene]), landsat8())
        .unwrap()
        .prepare()
        .unwrap();
    let image = prepared.dataset().sequence().first().unwrap();

    let plain = apply_brdf_correction(image, &BrdfOptions::default()).unwrap();
    let debug = apply_brdf_correction(image, &BrdfOptions { debug: true }).unwrap();

    // Debug mode adds bands but never changes the corrected values.
    for band in ["blue", "green", "red", "nir", "swir1", "swir2"] {
        assert_eq!(
            plain.band(band).unwrap().get(1, 1).unwrap(),
            debug.band(band).unwrap().get(1, 1).unwrap(),
            "{}",
            band
        );
    }
    assert!(debug.num_bands() > plain.num_bands());
}
