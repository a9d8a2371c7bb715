// Single-scattering physics for keV primary electrons: screened-Rutherford
// elastic scattering and Bethe continuous-slowing-down energy loss.
//
// Energies are in keV, lengths in nm, densities in g/cm^3. The numeric
// constants are part of the model contract and must not be rearranged; the
// trajectory bookkeeping downstream depends on bit-identical evaluation.

use crate::element::Element;
use rand::Rng;
use std::f64::consts::PI;

pub const AVOGADRO: f64 = 6.022141e23;

/// Screening parameter of the screened-Rutherford cross-section.
#[inline]
pub fn screening_factor(energy: f64, z: f64) -> f64 {
    3.4e-3 * z.powf(0.67) / energy
}

/// Total elastic cross-section in nm^2, relativistically corrected.
#[inline]
pub fn elastic_cross_section(energy: f64, z: f64, alpha: f64) -> f64 {
    5.21e-7 * z * z / (energy * energy) * 4.0 * PI / (alpha * (1.0 + alpha))
        * ((energy + 511.0) / (energy + 1022.0)).powi(2)
}

/// Elastic mean free path in nm from a cross-section in nm^2.
#[inline]
pub fn mean_free_path(a: f64, rho: f64, sigma: f64) -> f64 {
    a / (AVOGADRO * rho * 1e-21 * sigma)
}

/// Elastic mean free path of an electron at `energy` in `element`.
#[inline]
pub fn elastic_mean_free_path(element: &Element, energy: f64, alpha: f64) -> f64 {
    let sigma = elastic_cross_section(energy, element.z, alpha);
    mean_free_path(element.a, element.rho, sigma)
}

/// Sample a free-flight length from the exponential distribution with mean
/// `lambda`. The uniform draw is pinched away from 0 and 1 so the log stays
/// finite.
#[inline]
pub fn sample_step(lambda: f64, rng: &mut impl Rng) -> f64 {
    let u: f64 = rng.gen_range(1e-5..1.0 - 1e-5);
    -u.ln() * lambda
}

/// Mean ionisation potential J(Z) in keV.
#[inline]
pub fn ionisation_potential(z: f64) -> f64 {
    (9.76 * z + 58.5 * z.powf(-0.19)) * 1e-3
}

/// Bethe stopping power dE/ds in keV/nm, clamped to <= 0.
///
/// Below E/J + 0.85 < 1/1.166 the raw logarithm turns positive, which would
/// make the electron gain energy along the segment; the clamp keeps energies
/// non-increasing.
#[inline]
pub fn stopping_power(element: &Element, energy: f64) -> f64 {
    let loss = -7.85e-3 * element.rho * element.z / (element.a * energy)
        * (1.166 * (energy / element.j + 0.85)).ln();
    loss.min(0.0)
}

/// One sampled elastic deflection: polar cosine/sine and azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterAngles {
    pub cos_theta: f64,
    pub sin_theta: f64,
    pub psi: f64,
}

/// Sample a screened-Rutherford polar angle and a uniform azimuth.
///
/// cos(theta) is rounded through f32: the closed form oscillates O(1e-12)
/// past -1 for r1 near the pole and the round-trip clips that tail before
/// the sqrt. Returns None if any angle is NaN.
pub fn sample_scatter_angles(alpha: f64, rng: &mut impl Rng) -> Option<ScatterAngles> {
    let r1: f64 = rng.gen();
    let r2: f64 = rng.gen();

    let cos_theta = 1.0 - 2.0 * alpha * r1 / (1.0 + alpha - r1);
    let cos_theta = cos_theta as f32 as f64;
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let psi = 2.0 * PI * r2;

    if cos_theta.is_nan() || sin_theta.is_nan() || psi.is_nan() {
        return None;
    }
    Some(ScatterAngles {
        cos_theta,
        sin_theta,
        psi,
    })
}
