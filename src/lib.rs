//! Wigner-distribution-deconvolution (WDD) ptychography for 4D-STEM datasets.
//!
//! A 4D-STEM dataset records a full 2D diffraction pattern at every position
//! of a 2D scan. WDD ptychography recovers the specimen's complex
//! transmission function from those intensity-only measurements by
//! deconvolving the dataset with the Wigner distribution function of the
//! illuminating probe, modeled analytically from the microscope optics.
//!
//! The entry point is [`ptycho::wdd::wdd`]: it takes the measured dataset,
//! the optics in a [`ptycho::wdd::WddParams`] and an optional reference beam,
//! and returns the single-side-band object estimate as a 2D complex array.
//! The building blocks are public as well, so callers can assemble variants
//! of the pipeline or build their own reference beams: the probe model, the
//! axis-pair Fourier transforms and the Wigner synthesizer.
//!
//! The whole computation is pure and deterministic; heavy stages are
//! data-parallel over independent array positions via rayon.

pub mod error;
pub mod fft;
pub mod probe;
pub mod ptycho;

pub use error::{Result, WddError};
pub use probe::{make_probe, wavelength_pm};
pub use ptycho::ops::conj_multiply;
pub use ptycho::sparse::sparse4d;
pub use ptycho::wdd::{wdd, WddParams};
pub use ptycho::wigner::wigner_probe;
