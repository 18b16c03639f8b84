//! Ideal probe model: the reciprocal-space wavefunction of the probe-forming
//! aperture, derived from the optical parameters of the microscope.
//!
//! The probe is a unit-amplitude top-hat over all reciprocal-space samples
//! whose scattering semi-angle lies within the aperture. The scattering
//! semi-angle of a reciprocal-space sample `k` is `λ·k`, with the electron
//! wavelength `λ` computed relativistically from the accelerating voltage.

use crate::error::{Result, WddError};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

// CODATA 2018 values.
const PLANCK: f64 = 6.62607015e-34; // J s
const ELECTRON_MASS: f64 = 9.1093837015e-31; // kg
const ELEMENTARY_CHARGE: f64 = 1.602176634e-19; // C
const SPEED_OF_LIGHT: f64 = 2.99792458e8; // m/s

/// Relativistic electron wavelength in picometers for an accelerating voltage
/// in kilovolts.
///
/// At 200 kV this evaluates to about 2.508 pm.
pub fn wavelength_pm(voltage_kv: f64) -> Result<f64> {
    if !voltage_kv.is_finite() || voltage_kv <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "accelerating voltage must be positive and finite, got {voltage_kv} kV"
        )));
    }
    let ev = ELEMENTARY_CHARGE * voltage_kv * 1e3;
    let lambda_m = PLANCK
        / (2.0 * ELECTRON_MASS * ev
            * (1.0 + ev / (2.0 * ELECTRON_MASS * SPEED_OF_LIGHT * SPEED_OF_LIGHT)))
            .sqrt();
    Ok(lambda_m * 1e12)
}

/// Centered reciprocal-space coordinates (in inverse picometers) for an axis
/// of `n` real-space pixels with `calibration_pm` picometers per pixel.
///
/// Index `n / 2` carries the zero frequency, matching the centering
/// convention of [`crate::fft::fftshift2`].
pub fn fourier_coords_1d(n: usize, calibration_pm: f64) -> Array1<f64> {
    let step = 1.0 / (n as f64 * calibration_pm);
    let center = (n / 2) as f64;
    Array1::from_shape_fn(n, |i| (i as f64 - center) * step)
}

/// Builds the reciprocal-space aperture wavefunction of the ideal probe.
///
/// # Arguments
/// - `aperture_mrad`: probe-forming aperture semi-angle in milliradians.
/// - `voltage_kv`: electron accelerating voltage in kilovolts.
/// - `image_size`: output shape `(ny, nx)`.
/// - `calibration_pm`: real-space pixel size in picometers.
///
/// # Returns
/// A complex `(ny, nx)` tensor with unit amplitude inside the aperture and
/// zero outside. Deterministic pure function of its parameters.
///
/// # Errors
/// `WddError::InvalidInput` for non-positive or non-finite optics, an empty
/// image size, or an aperture that admits no reciprocal-space sample.
pub fn make_probe(
    aperture_mrad: f64,
    voltage_kv: f64,
    image_size: (usize, usize),
    calibration_pm: f64,
) -> Result<Array2<Complex64>> {
    let (ny, nx) = image_size;
    if ny == 0 || nx == 0 {
        return Err(WddError::InvalidInput(format!(
            "image size must be non-empty, got ({ny}, {nx})"
        )));
    }
    if !aperture_mrad.is_finite() || aperture_mrad <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "aperture must be positive and finite, got {aperture_mrad} mrad"
        )));
    }
    if !calibration_pm.is_finite() || calibration_pm <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "calibration must be positive and finite, got {calibration_pm} pm"
        )));
    }
    let lambda_pm = wavelength_pm(voltage_kv)?;
    let ky = fourier_coords_1d(ny, calibration_pm);
    let kx = fourier_coords_1d(nx, calibration_pm);
    let alpha_max = aperture_mrad * 1e-3;

    let probe = Array2::from_shape_fn((ny, nx), |(i, j)| {
        let k = (ky[i] * ky[i] + kx[j] * kx[j]).sqrt();
        if k * lambda_pm <= alpha_max {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    });
    if probe.iter().all(|c| c.norm_sqr() == 0.0) {
        return Err(WddError::InvalidInput(
            "degenerate aperture: no reciprocal-space sample lies inside it".into(),
        ));
    }
    Ok(probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wavelength_matches_reference_values() {
        // Standard TEM voltages; reference values from the relativistic
        // de Broglie relation.
        assert_abs_diff_eq!(wavelength_pm(200.0).unwrap(), 2.5079, epsilon = 1e-3);
        assert_abs_diff_eq!(wavelength_pm(300.0).unwrap(), 1.9687, epsilon = 1e-3);
    }

    #[test]
    fn wavelength_rejects_degenerate_voltage() {
        assert!(wavelength_pm(0.0).is_err());
        assert!(wavelength_pm(-60.0).is_err());
        assert!(wavelength_pm(f64::NAN).is_err());
    }

    #[test]
    fn fourier_coords_are_centered() {
        let coords = fourier_coords_1d(8, 20.0);
        assert_abs_diff_eq!(coords[4], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(coords[0], -4.0 / (8.0 * 20.0), epsilon = 1e-15);
        assert_abs_diff_eq!(coords[7], 3.0 / (8.0 * 20.0), epsilon = 1e-15);
    }

    #[test]
    fn probe_is_a_centered_top_hat() {
        let probe = make_probe(30.0, 200.0, (16, 16), 20.0).unwrap();
        // Zero frequency is always inside the aperture.
        assert_abs_diff_eq!(probe[(8, 8)].re, 1.0, epsilon = 1e-15);
        // Far corner is well outside a 30 mrad aperture at this sampling.
        assert_abs_diff_eq!(probe[(0, 0)].norm(), 0.0, epsilon = 1e-15);
        // Symmetric about the center on even sizes.
        assert_eq!(probe[(8 + 3, 8)], probe[(8 - 3, 8)]);
        assert_eq!(probe[(8, 8 + 2)], probe[(8, 8 - 2)]);
        // The disk has interior beyond the single center pixel.
        let inside = probe.iter().filter(|c| c.norm_sqr() > 0.0).count();
        assert!(inside > 1, "aperture disk too small: {inside} pixels");
    }

    #[test]
    fn probe_rejects_degenerate_optics() {
        assert!(make_probe(0.0, 200.0, (8, 8), 20.0).is_err());
        assert!(make_probe(30.0, 200.0, (0, 8), 20.0).is_err());
        assert!(make_probe(30.0, 200.0, (8, 8), -1.0).is_err());
    }
}
