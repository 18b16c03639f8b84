//! Wigner distribution function of the ideal probe.
//!
//! The Wigner distribution as defined by Nellist and Rodenburg is a shifted
//! Fourier function: at every real-space shift, the aperture wavefunction is
//! displaced and overlapped with its own conjugate. For a top-hat aperture
//! the overlap vanishes at twice the aperture radius, which is what gives
//! WDD ptychography its double-resolution transfer.
//!
//! Reference: Yang et al., "Electron ptychographic phase imaging of light
//! elements in crystalline materials using Wigner distribution
//! deconvolution", Ultramicroscopy 180 (2017) 173-179.

use crate::error::{Result, WddError};
use crate::fft::shift2;
use crate::probe::make_probe;
use ndarray::{s, Array2, Array4, Zip};
use num_complex::Complex64;
use rayon::prelude::*;

/// Builds the 4D Wigner distribution tensor of the ideal probe.
///
/// The output has shape `(ny, nx, ny, nx)`: axes (0, 1) are reciprocal-space
/// frequency, axes (2, 3) index a real-space shift grid spanning the full
/// image. The slab at shift `(py, px)` is the unshifted conjugate probe
/// multiplied by the probe displaced by `-(py - ny/2, px - nx/2)` pixels
/// (bilinear, non-circular). At the grid center `(ny/2, nx/2)` the offset is
/// exactly zero and the slab equals `|probe|²`, the maximal-intensity slice.
///
/// The per-shift slabs are independent, so they are computed with a rayon
/// parallel-for and assembled afterwards.
///
/// # Arguments
/// - `aperture_mrad`, `voltage_kv`, `calibration_pm`: optics, as for
///   [`make_probe`].
/// - `image_size`: output grid `(ny, nx)`.
/// - `intensity_param`: normalization scalar dividing the probe wavefunction
///   so the theoretical intensity matches an experimental dataset; pass 1.0
///   for an unscaled distribution.
pub fn wigner_probe(
    aperture_mrad: f64,
    voltage_kv: f64,
    image_size: (usize, usize),
    calibration_pm: f64,
    intensity_param: f64,
) -> Result<Array4<Complex64>> {
    if !intensity_param.is_finite() || intensity_param <= 0.0 {
        return Err(WddError::InvalidInput(format!(
            "intensity normalization must be positive and finite, got {intensity_param}"
        )));
    }
    let probe = make_probe(aperture_mrad, voltage_kv, image_size, calibration_pm)?;
    let probe = probe.mapv(|c| c / intensity_param);

    let (ny, nx) = image_size;
    let center_y = (ny / 2) as f64;
    let center_x = (nx / 2) as f64;

    let slabs: Vec<Array2<Complex64>> = (0..ny * nx)
        .into_par_iter()
        .map(|p| {
            let py = p / nx;
            let px = p % nx;
            let offset_y = py as f64 - center_y;
            let offset_x = px as f64 - center_x;
            let mut slab = shift2(&probe, (-offset_y, -offset_x));
            Zip::from(&mut slab)
                .and(&probe)
                .for_each(|moved, &fixed| *moved = fixed.conj() * *moved);
            slab
        })
        .collect();

    let mut wigner = Array4::from_elem((ny, nx, ny, nx), Complex64::new(0.0, 0.0));
    for (p, slab) in slabs.into_iter().enumerate() {
        let (py, px) = (p / nx, p % nx);
        wigner.slice_mut(s![.., .., py, px]).assign(&slab);
    }
    Ok(wigner)
}
