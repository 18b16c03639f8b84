//! Single-side-band reconstruction by Wigner distribution deconvolution.
//!
//! The measured 4D dataset is Fourier transformed over its detector axes and
//! inverse transformed over its scan axes, landing in the mixed
//! frequency/position domain where the overlapping-disk "trotters" live. The
//! theoretical Wigner distribution of the ideal probe, inverse transformed
//! over its frequency axes, is conjugate-multiplied into the data and the
//! product sparsified where the probe intensity is effectively zero. The
//! dominant trotter slice, one past the grid center, carries the linear
//! object phase; a final forward transform turns it into the single-side-band
//! object estimate.
//!
//! Reference: Yang et al., "Electron ptychographic phase imaging of light
//! elements in crystalline materials using Wigner distribution
//! deconvolution", Ultramicroscopy 180 (2017) 173-179.

use crate::error::{Result, WddError};
use crate::fft::{
    fft2, fft2_pair, fftshift4, ifftshift2, ifftshift4, AxisPair,
};
use crate::probe::make_probe;
use crate::ptycho::ops::{conj_multiply, ensure_finite2, ensure_finite4};
use crate::ptycho::sparse::{sparse4d, DEFAULT_BIT_DEPTH};
use crate::ptycho::wigner::wigner_probe;
use log::{debug, info};
use ndarray::{s, Array2, Array4, Zip};
use num_complex::Complex64;
use rustfft::FftDirection;
use serde::{Deserialize, Serialize};

/// Optics and sampling parameters of a reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WddParams {
    /// Probe-forming aperture semi-angle in milliradians.
    pub aperture_mrad: f64,
    /// Electron accelerating voltage in kilovolts.
    pub voltage_kv: f64,
    /// Output image size `(ny, nx)`; must equal the dataset's detector
    /// dimensions.
    pub image_size: (usize, usize),
    /// Real-space pixel size in picometers.
    pub calibration_pm: f64,
}

/// Reconstructs the single-side-band object function from a 4D-STEM dataset.
///
/// `data4d` is indexed `(scan_y, scan_x, det_y, det_x)`; its detector
/// dimensions must equal `params.image_size`, and the trotter combination
/// additionally requires the scan dimensions to match the Wigner grid.
/// `reference_beam` is the expected probe response multiplied into the
/// extracted trotter slice before the final transform; `None` uses the ideal
/// probe wavefunction.
///
/// Indexing convention: for an axis of length `n` the centering shifts of the
/// intermediate transforms place the zero bin at `n / 2` (floor), and the
/// dominant trotter is extracted one past that center, at `n / 2 + 1` on each
/// shift axis. Both shift axes therefore need `n / 2 + 1 < n`, i.e. length at
/// least 3. The final transform undoes the centering before going forward, so
/// a uniform specimen reconstructs with uniform phase instead of a
/// checkerboard.
///
/// A pure function of its inputs: no global or persistent state, every
/// intermediate tensor is produced by one stage and consumed by the next.
///
/// # Errors
/// - `WddError::ShapeMismatch`: detector dimensions disagree with
///   `image_size`, the scan grid disagrees with the Wigner grid, or the
///   reference beam disagrees with the trotter slice.
/// - `WddError::InvalidInput`: degenerate optics, zero or non-finite mean
///   diffraction intensity, or shift axes too short for trotter extraction.
/// - `WddError::NumericInstability`: non-finite values after any transform
///   stage, reported with the stage name.
pub fn wdd(
    data4d: &Array4<f64>,
    params: &WddParams,
    reference_beam: Option<&Array2<Complex64>>,
) -> Result<Array2<Complex64>> {
    let (ny, nx) = params.image_size;
    let (s0, s1, d0, d1) = data4d.dim();
    if (d0, d1) != (ny, nx) {
        return Err(WddError::ShapeMismatch {
            context: "dataset detector dimensions",
            expected: vec![ny, nx],
            actual: vec![d0, d1],
        });
    }

    // Stage 1: ideal probe for the requested optics.
    let probe = make_probe(
        params.aperture_mrad,
        params.voltage_kv,
        params.image_size,
        params.calibration_pm,
    )?;

    // Stage 2: match the theoretical probe intensity to the measured
    // photon-count regime.
    let mainbeam_intensity: f64 = probe.iter().map(|c| c.norm_sqr()).sum();
    let n_scan = (s0 * s1) as f64;
    let diffractogram_intensity = data4d.sum() / n_scan;
    if !diffractogram_intensity.is_finite() || diffractogram_intensity <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "mean diffraction intensity must be positive and finite, got {diffractogram_intensity}"
        )));
    }
    let intensity_changer = (mainbeam_intensity / diffractogram_intensity).sqrt();
    if !intensity_changer.is_finite() || intensity_changer <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "degenerate intensity normalization {intensity_changer}"
        )));
    }
    info!("intensity normalization: {intensity_changer:.6e}");

    // Stage 3: Wigner distribution of the ideal probe at matched intensity.
    debug!("synthesizing {ny}x{nx} Wigner probe");
    let wigner = wigner_probe(
        params.aperture_mrad,
        params.voltage_kv,
        params.image_size,
        params.calibration_pm,
        intensity_changer,
    )?;

    // Stage 4: detector-domain transform, one 2D FFT per scan position.
    debug!("detector-axis forward transform of {s0}x{s1} scan positions");
    let mut data_ft = data4d.mapv(|v| Complex64::new(v, 0.0));
    fft2_pair(&mut data_ft, AxisPair::Detector, FftDirection::Forward);
    let data_ft = fftshift4(&data_ft, AxisPair::Detector);
    ensure_finite4("detector transform", &data_ft)?;

    // Stage 5: scan-domain inverse transform, one 2D IFFT per detector pixel.
    debug!("scan-axis inverse transform of {d0}x{d1} detector pixels");
    let mut trotters = data_ft;
    fft2_pair(&mut trotters, AxisPair::Scan, FftDirection::Inverse);
    let trotters = ifftshift4(&trotters, AxisPair::Scan);
    ensure_finite4("trotter transform", &trotters)?;

    // Stage 6: inverse transform of the Wigner tensor's frequency axes.
    let mut inverse_wigner = wigner;
    fft2_pair(&mut inverse_wigner, AxisPair::Scan, FftDirection::Inverse);
    let inverse_wigner = ifftshift4(&inverse_wigner, AxisPair::Scan);
    ensure_finite4("inverse Wigner transform", &inverse_wigner)?;

    // Stage 7: conjugate-multiply and suppress entries where the probe
    // intensity cannot support deconvolution.
    let probe_intensity = inverse_wigner.mapv(|c| c.norm_sqr());
    let psi_wigner = conj_multiply(&trotters, &inverse_wigner)?;
    let psi_wigner = sparse4d(&psi_wigner, &probe_intensity, DEFAULT_BIT_DEPTH)?;

    // Stage 8: the dominant trotter, one past the shift-grid center.
    if ny / 2 + 1 >= ny || nx / 2 + 1 >= nx {
        return Err(WddError::InvalidInput(format!(
            "shift axes ({ny}, {nx}) too short to extract the trotter at (center + 1)"
        )));
    }
    let mut trotter_slice: Array2<Complex64> = psi_wigner
        .slice(s![.., .., ny / 2 + 1, nx / 2 + 1])
        .to_owned();

    // Stage 9: weight by the expected probe response.
    let beam = reference_beam.unwrap_or(&probe);
    if beam.dim() != trotter_slice.dim() {
        return Err(WddError::ShapeMismatch {
            context: "reference beam",
            expected: trotter_slice.shape().to_vec(),
            actual: beam.shape().to_vec(),
        });
    }
    Zip::from(&mut trotter_slice)
        .and(beam)
        .for_each(|t, &b| *t = *t * b);

    // Stage 10: undo the centering, then transform forward into the
    // single-side-band object estimate.
    let mut single_side_band = ifftshift2(&trotter_slice);
    fft2(&mut single_side_band, FftDirection::Forward);
    ensure_finite2("single-side-band transform", &single_side_band)?;
    debug!("reconstruction complete");
    Ok(single_side_band)
}
