//! Landsat sensor presets
//!
//! Collection-1 surface-reflectance configurations for Landsat 5, 7 and 8:
//! CFMASK clear/water QA codes, raw-to-common band tables with USGS scaling
//! factors (1e-4 reflective, 0.1 thermal), and the published Tasseled Cap
//! coefficient matrices.

use crate::sensor::{CommonBand, SensorSpec};

const QA_BAND: &str = "pixel_qa";

/// QA codes for clear and water pixels in Landsat 4-7 Collection 1
const L47_VALID_QA: [f64; 4] = [66.0, 68.0, 130.0, 132.0];

/// QA codes for clear and water pixels in Landsat 8 Collection 1
const L8_VALID_QA: [f64; 6] = [322.0, 386.0, 324.0, 388.0, 836.0, 900.0];

const REFLECTIVE_SCALE: f64 = 0.0001;
const THERMAL_SCALE: f64 = 0.1;

fn tm_common_bands() -> Vec<CommonBand> {
    vec![
        CommonBand::new("B1", "blue", REFLECTIVE_SCALE),
        CommonBand::new("B2", "green", REFLECTIVE_SCALE),
        CommonBand::new("B3", "red", REFLECTIVE_SCALE),
        CommonBand::new("B4", "nir", REFLECTIVE_SCALE),
        CommonBand::new("B5", "swir1", REFLECTIVE_SCALE),
        CommonBand::new("B6", "thermal", THERMAL_SCALE),
        CommonBand::new("B7", "swir2", REFLECTIVE_SCALE),
    ]
}

fn tm_bands() -> Vec<String> {
    ["B1", "B2", "B3", "B4", "B5", "B6", "B7"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Landsat 5 TM surface reflectance.
///
/// Tasseled Cap after Crist & Cicone (1984), "A physically-based
/// transformation of Thematic Mapper data", IEEE TGRS,
/// <https://doi.org/10.1109/TGRS.1984.350619>. Rows over
/// [blue, green, red, nir, swir1, swir2].
pub fn landsat5() -> SensorSpec {
    SensorSpec {
        name: "Landsat 5".into(),
        qa_band: QA_BAND.into(),
        valid_qa: L47_VALID_QA.to_vec(),
        bands: tm_bands(),
        common_bands: tm_common_bands(),
        tasseled_cap: Some([
            [0.3037, 0.2793, 0.4743, 0.5585, 0.5082, 0.1863], // Brightness
            [-0.2848, -0.2435, -0.5436, 0.7243, 0.0840, -0.1800], // Greenness
            [0.1509, 0.1973, 0.3279, 0.3406, -0.7112, -0.4572], // Wetness
            [-0.8242, 0.0849, 0.4392, -0.0580, 0.2012, -0.2768],
            [-0.3280, 0.0549, 0.1075, 0.1855, -0.4357, 0.8085],
            [0.1084, -0.9022, 0.4120, 0.0573, -0.0251, 0.0238],
        ]),
    }
}

/// Landsat 7 ETM+ surface reflectance.
///
/// Tasseled Cap after Huang et al. (2002), "Derivation of a tasselled cap
/// transformation based on Landsat 7 at-satellite reflectance", IJRS,
/// <https://doi.org/10.1080/01431160110106113>.
pub fn landsat7() -> SensorSpec {
    SensorSpec {
        name: "Landsat 7".into(),
        qa_band: QA_BAND.into(),
        valid_qa: L47_VALID_QA.to_vec(),
        bands: tm_bands(),
        common_bands: tm_common_bands(),
        tasseled_cap: Some([
            [0.3561, 0.3972, 0.3904, 0.6966, 0.2286, 0.1596], // Brightness
            [-0.3344, -0.3544, -0.4556, 0.6966, -0.0242, -0.2630], // Greenness
            [0.2626, 0.2141, 0.0926, 0.0656, -0.7629, -0.5388], // Wetness
            [0.0805, -0.0498, 0.1950, -0.1327, 0.5752, -0.7775],
            [-0.7252, -0.0202, 0.6683, 0.0631, -0.1494, -0.0274],
            [0.4000, -0.8172, 0.3832, 0.0602, -0.1095, 0.0985],
        ]),
    }
}

/// Landsat 8 OLI/TIRS surface reflectance.
///
/// Tasseled Cap after Baig et al. (2014), "Derivation of a tasselled cap
/// transformation based on Landsat 8 at-satellite reflectance", RSL,
/// <https://doi.org/10.1080/2150704X.2014.915434>.
pub fn landsat8() -> SensorSpec {
    SensorSpec {
        name: "Landsat 8".into(),
        qa_band: QA_BAND.into(),
        valid_qa: L8_VALID_QA.to_vec(),
        bands: ["B1", "B2", "B3", "B4", "B5", "B6", "B7", "B10", "B11"]
            .into_iter()
            .map(String::from)
            .collect(),
        common_bands: vec![
            CommonBand::new("B1", "coastal", REFLECTIVE_SCALE),
            CommonBand::new("B2", "blue", REFLECTIVE_SCALE),
            CommonBand::new("B3", "green", REFLECTIVE_SCALE),
            CommonBand::new("B4", "red", REFLECTIVE_SCALE),
            CommonBand::new("B5", "nir", REFLECTIVE_SCALE),
            CommonBand::new("B6", "swir1", REFLECTIVE_SCALE),
            CommonBand::new("B7", "swir2", REFLECTIVE_SCALE),
            CommonBand::new("B10", "thermal1", THERMAL_SCALE),
            CommonBand::new("B11", "thermal2", THERMAL_SCALE),
        ],
        tasseled_cap: Some([
            [0.3029, 0.2786, 0.4733, 0.5599, 0.5080, 0.1872], // Brightness
            [-0.2941, -0.2430, -0.5424, 0.7276, 0.0713, -0.1600], // Greenness
            [0.1511, 0.1973, 0.3283, 0.3407, -0.7117, -0.4559], // Wetness
            [-0.8239, 0.0849, 0.4396, -0.0580, 0.2013, -0.2773],
            [-0.3294, 0.0557, 0.1056, 0.1855, -0.4349, 0.8085],
            [0.1079, -0.9023, 0.4119, 0.0575, -0.0259, 0.0252],
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landsat8_rename_order() {
        let spec = landsat8();
        let pairs = spec.rename_pairs();
        let commons: Vec<&str> = pairs.iter().map(|(_, c)| c.as_str()).collect();
        assert_eq!(
            commons,
            vec![
                "coastal", "blue", "green", "red", "nir", "swir1", "swir2", "thermal1",
                "thermal2"
            ]
        );
    }

    #[test]
    fn test_reflective_bands_scale_to_unit_reflectance() {
        for spec in [landsat5(), landsat7(), landsat8()] {
            let blue = spec
                .common_bands
                .iter()
                .find(|cb| cb.common == "blue")
                .unwrap();
            assert_eq!(blue.scaling, 0.0001, "{}", spec.name);
        }
    }

    #[test]
    fn test_all_presets_have_tasseled_cap() {
        for spec in [landsat5(), landsat7(), landsat8()] {
            assert!(spec.tasseled_cap.is_some(), "{}", spec.name);
        }
    }

    #[test]
    fn test_l47_qa_codes_are_clear_or_water() {
        let spec = landsat5();
        assert_eq!(spec.valid_qa, vec![66.0, 68.0, 130.0, 132.0]);
        assert_eq!(spec.qa_band, "pixel_qa");
    }
}
