//! Intensity-based sparsification.
//!
//! The trotter combination divides signal by probe intensity in effect; where
//! the probe intensity is effectively zero, that combination only amplifies
//! noise. The sparsifier zeroes those entries up front using a data-adaptive
//! threshold derived from the dynamic range of the reference intensity.

use crate::error::{Result, WddError};
use ndarray::{Array4, Zip};
use num_complex::Complex64;

/// Default dynamic range of the sparsification threshold, in bits.
pub const DEFAULT_BIT_DEPTH: u32 = 32;

/// Zeroes entries of `data` where the companion `reference` intensity falls
/// at or below `max(reference) / 2^bit_depth`; every other entry passes
/// through unchanged.
///
/// The threshold adapts to the reference's own scale, so rescaling both
/// inputs by a common positive factor selects the same entries. Entries with
/// an exactly zero reference are always zeroed. No entry's magnitude ever
/// increases.
///
/// # Errors
/// `WddError::ShapeMismatch` if the tensors disagree in shape,
/// `WddError::InvalidInput` if the reference contains non-finite values.
pub fn sparse4d(
    data: &Array4<Complex64>,
    reference: &Array4<f64>,
    bit_depth: u32,
) -> Result<Array4<Complex64>> {
    if data.dim() != reference.dim() {
        return Err(WddError::ShapeMismatch {
            context: "sparsification",
            expected: data.shape().to_vec(),
            actual: reference.shape().to_vec(),
        });
    }
    if reference.iter().any(|r| !r.is_finite()) {
        return Err(WddError::InvalidInput(
            "sparsification reference contains non-finite values".into(),
        ));
    }
    let max_ref = reference.iter().cloned().fold(f64::MIN, f64::max);
    let cutoff = max_ref / 2f64.powi(bit_depth as i32);

    let mut out = data.clone();
    Zip::from(&mut out).and(reference).par_for_each(|o, &r| {
        if r <= cutoff {
            *o = Complex64::new(0.0, 0.0);
        }
    });
    Ok(out)
}
