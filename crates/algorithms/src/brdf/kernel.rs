//! BRDF kernels and correction coefficients
//!
//! Ross-Thick volumetric and Li-Sparse-Reciprocal geometric kernels with the
//! fixed crown geometry b/r = 1, h/b = 2, plus the per-band empirical
//! (f_iso, f_vol, f_geo) coefficients and the latitude polynomial for the
//! reference solar zenith. All constants are reproduced verbatim from the
//! reference implementation.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Spheroid vertical-to-horizontal crown radius ratio (b/r)
const CROWN_SHAPE: f64 = 1.0;
/// Crown center height to vertical radius ratio (h/b)
const CROWN_HEIGHT: f64 = 2.0;

/// The two kernel values for one viewing/illumination geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    /// Ross-Thick volumetric kernel
    pub k_vol: f64,
    /// Li-Sparse-Reciprocal geometric kernel
    pub k_geo: f64,
}

/// Per-band kernel weights for the correction.
#[derive(Debug, Clone, Copy)]
pub struct BandCoefficients {
    /// Common band name
    pub band: &'static str,
    pub f_iso: f64,
    pub f_vol: f64,
    pub f_geo: f64,
}

/// Empirical kernel weights for the six common reflective bands.
pub const BRDF_COEFFICIENTS: [BandCoefficients; 6] = [
    BandCoefficients { band: "blue", f_iso: 0.0774, f_vol: 0.0372, f_geo: 0.0079 },
    BandCoefficients { band: "green", f_iso: 0.1306, f_vol: 0.0580, f_geo: 0.0178 },
    BandCoefficients { band: "red", f_iso: 0.1690, f_vol: 0.0574, f_geo: 0.0227 },
    BandCoefficients { band: "nir", f_iso: 0.3093, f_vol: 0.1535, f_geo: 0.0330 },
    BandCoefficients { band: "swir1", f_iso: 0.3430, f_vol: 0.1154, f_geo: 0.0453 },
    BandCoefficients { band: "swir2", f_iso: 0.2658, f_vol: 0.0639, f_geo: 0.0387 },
];

/// Latitude polynomial for the reference solar zenith, in degrees
const SUN_ZENITH_POLY: [f64; 7] = [
    31.0076, -0.1272, 0.01187, 2.4e-5, -9.48e-7, -1.95e-9, 6.15e-11,
];

/// Reference solar zenith (radians) for a latitude in degrees.
pub fn reference_sun_zenith(lat_deg: f64) -> f64 {
    let mut degrees = 0.0;
    for coef in SUN_ZENITH_POLY.iter().rev() {
        degrees = degrees * lat_deg + coef;
    }
    degrees.to_radians()
}

/// Evaluate the volumetric and geometric kernels.
///
/// `theta_i` is the illumination zenith, `theta_v` the viewing zenith and
/// `azimuth` the relative azimuth between them, all in radians.
pub fn kernel(theta_i: f64, theta_v: f64, azimuth: f64) -> Kernel {
    let cos_i = theta_i.cos();
    let cos_v = theta_v.cos();

    // Ross-Thick volumetric kernel.
    let cos_g = cos_i * cos_v + theta_i.sin() * theta_v.sin() * azimuth.cos();
    let g = cos_g.clamp(-1.0, 1.0).acos();
    let k_vol = ((FRAC_PI_2 - g) * g.cos() + g.sin()) / (cos_i + cos_v) - FRAC_PI_4;

    // Li-Sparse-Reciprocal geometric kernel with equivalent angles scaled by
    // the crown shape ratio.
    let tan_i1 = (CROWN_SHAPE * theta_i.tan()).max(0.0);
    let tan_v1 = (CROWN_SHAPE * theta_v.tan()).max(0.0);
    let theta_i1 = tan_i1.atan();
    let theta_v1 = tan_v1.atan();
    let sec_i1 = 1.0 / theta_i1.cos();
    let sec_v1 = 1.0 / theta_v1.cos();

    let cos_g1 =
        theta_i1.cos() * theta_v1.cos() + theta_i1.sin() * theta_v1.sin() * azimuth.cos();
    let g1 = cos_g1.clamp(-1.0, 1.0).acos();

    let d_sq = (tan_i1 * tan_i1 + tan_v1 * tan_v1 - 2.0 * tan_i1 * tan_v1 * azimuth.cos())
        .max(0.0);
    let tmp = tan_i1 * tan_v1 * azimuth.sin();
    let cos_t = CROWN_HEIGHT * (d_sq + tmp * tmp).sqrt() / (sec_i1 + sec_v1);
    let t = cos_t.clamp(-1.0, 1.0).acos();

    let overlap = ((t - t.sin() * t.cos()) * (sec_i1 + sec_v1) / PI).max(0.0);
    let k_geo = overlap - sec_i1 - sec_v1 + (1.0 + cos_g1) * sec_i1 * sec_v1 / 2.0;

    Kernel { k_vol, k_geo }
}

/// Modeled reflectance for one band at one geometry:
/// `P = k_geo * f_geo + k_vol * f_vol + f_iso`.
pub fn kernel_reflectance(kernel: &Kernel, coef: &BandCoefficients) -> f64 {
    kernel.k_geo * coef.f_geo + kernel.k_vol * coef.f_vol + coef.f_iso
}

/// Per-band multiplier rescaling an observation to the reference geometry:
/// the ratio of the modeled reflectances.
pub fn correction_factor(
    sensor: &Kernel,
    reference: &Kernel,
    coef: &BandCoefficients,
) -> f64 {
    kernel_reflectance(reference, coef) / kernel_reflectance(sensor, coef)
}
