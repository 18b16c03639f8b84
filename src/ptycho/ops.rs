//! Elementwise kernels shared by the pipeline stages.

use crate::error::{Result, WddError};
use ndarray::{Array2, Array4, Zip};
use num_complex::Complex64;

/// Multiplies two 4D complex tensors elementwise, conjugating the second
/// operand: `out[...] = a[...] * conj(b[...])`.
///
/// The operation has no cross-element dependency, so it runs as a parallel
/// `Zip` over the full tensors. Multiplying a tensor with itself yields its
/// elementwise squared magnitude, real and non-negative.
///
/// # Errors
/// `WddError::ShapeMismatch` if the operands disagree in shape.
pub fn conj_multiply(a: &Array4<Complex64>, b: &Array4<Complex64>) -> Result<Array4<Complex64>> {
    if a.dim() != b.dim() {
        return Err(WddError::ShapeMismatch {
            context: "conjugate multiply",
            expected: a.shape().to_vec(),
            actual: b.shape().to_vec(),
        });
    }
    let mut out = Array4::from_elem(a.dim(), Complex64::new(0.0, 0.0));
    Zip::from(&mut out)
        .and(a)
        .and(b)
        .par_for_each(|o, &x, &y| *o = x * y.conj());
    Ok(out)
}

/// Fails with `WddError::NumericInstability` if any entry of a 4D tensor is
/// non-finite. `stage` names the transform that produced the tensor.
pub fn ensure_finite4(stage: &'static str, data: &Array4<Complex64>) -> Result<()> {
    if data.iter().all(|c| c.re.is_finite() && c.im.is_finite()) {
        Ok(())
    } else {
        Err(WddError::NumericInstability { stage })
    }
}

/// 2D counterpart of [`ensure_finite4`].
pub fn ensure_finite2(stage: &'static str, data: &Array2<Complex64>) -> Result<()> {
    if data.iter().all(|c| c.re.is_finite() && c.im.is_finite()) {
        Ok(())
    } else {
        Err(WddError::NumericInstability { stage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_tensor(seed: u64) -> Array4<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array4::from_shape_fn((2, 3, 4, 2), |_| {
            Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        })
    }

    #[test]
    fn multiplies_with_conjugated_second_operand() {
        let a = random_tensor(1);
        let b = random_tensor(2);
        let out = conj_multiply(&a, &b).unwrap();
        for ((x, y), o) in a.iter().zip(b.iter()).zip(out.iter()) {
            let expected = x * y.conj();
            assert_abs_diff_eq!(o.re, expected.re, epsilon = 1e-12);
            assert_abs_diff_eq!(o.im, expected.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn self_multiply_is_real_and_non_negative() {
        let a = random_tensor(3);
        let out = conj_multiply(&a, &a).unwrap();
        for (x, o) in a.iter().zip(out.iter()) {
            assert_abs_diff_eq!(o.im, 0.0, epsilon = 1e-12);
            assert!(o.re >= 0.0);
            assert_abs_diff_eq!(o.re, x.norm_sqr(), epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_shape_mismatch() {
        let a = random_tensor(4);
        let b = Array4::from_elem((2, 3, 4, 3), Complex64::new(0.0, 0.0));
        assert!(matches!(
            conj_multiply(&a, &b),
            Err(WddError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn finite_guard_flags_nan_and_inf() {
        let mut a = random_tensor(5);
        assert!(ensure_finite4("stage", &a).is_ok());
        a[(0, 1, 2, 0)] = Complex64::new(f64::NAN, 0.0);
        assert!(matches!(
            ensure_finite4("stage", &a),
            Err(WddError::NumericInstability { stage: "stage" })
        ));
        let mut b = Array2::from_elem((2, 2), Complex64::new(1.0, 0.0));
        b[(1, 1)] = Complex64::new(0.0, f64::INFINITY);
        assert!(ensure_finite2("stage", &b).is_err());
    }
}
