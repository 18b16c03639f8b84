//! 2D Fourier transforms over axis pairs of 2D and 4D complex tensors,
//! zero-frequency centering shifts and sub-pixel interpolation shifting.
//!
//! A 4D-STEM tensor carries two independent 2D transform domains: the scan
//! axes (0, 1) and the detector axes (2, 3). Every scan position holds a full
//! detector frame and vice versa, so a transform over one axis pair is a batch
//! of independent 2D transforms, one per position on the other pair. The
//! batches share `rustfft` plans and run as a rayon parallel-for; each lane
//! writes to a disjoint part of the tensor.
//!
//! Centering follows the NumPy convention: `fftshift` moves the
//! zero-frequency bin to index `n / 2`, `ifftshift` is its exact inverse
//! (the two differ for odd lengths). Inverse transforms are normalized by
//! `1 / N` like `numpy.fft.ifft2`.

use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, Array4, ArrayViewMut2, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// Selects which axis pair of a 4D tensor a transform or shift acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPair {
    /// Leading axes (0, 1): scan positions, or the Wigner frequency axes.
    Scan,
    /// Trailing axes (2, 3): detector pixels, or the Wigner shift axes.
    Detector,
}

/// In-place 2D transform of a single frame, one axis at a time.
///
/// `fft0` must be planned for the frame's first dimension, `fft1` for its
/// second. Lanes are gathered through a scratch buffer so the view does not
/// need to be contiguous.
fn fft2_frame(
    frame: &mut ArrayViewMut2<'_, Complex64>,
    fft0: &Arc<dyn Fft<f64>>,
    fft1: &Arc<dyn Fft<f64>>,
) {
    let (n0, n1) = frame.dim();
    let mut buf = vec![Complex64::new(0.0, 0.0); n0.max(n1)];
    let scratch_len = fft0
        .get_inplace_scratch_len()
        .max(fft1.get_inplace_scratch_len());
    let mut scratch = vec![Complex64::new(0.0, 0.0); scratch_len];

    for mut row in frame.rows_mut() {
        for (b, v) in buf.iter_mut().zip(row.iter()) {
            *b = *v;
        }
        fft1.process_with_scratch(&mut buf[..n1], &mut scratch);
        for (v, b) in row.iter_mut().zip(buf.iter()) {
            *v = *b;
        }
    }
    for mut col in frame.columns_mut() {
        for (b, v) in buf.iter_mut().zip(col.iter()) {
            *b = *v;
        }
        fft0.process_with_scratch(&mut buf[..n0], &mut scratch);
        for (v, b) in col.iter_mut().zip(buf.iter()) {
            *v = *b;
        }
    }
}

/// In-place 2D FFT of a 2D tensor. Inverse transforms are scaled by `1 / N`.
pub fn fft2(data: &mut Array2<Complex64>, direction: FftDirection) {
    let (n0, n1) = data.dim();
    let mut planner = FftPlanner::new();
    let fft0 = planner.plan_fft(n0, direction);
    let fft1 = planner.plan_fft(n1, direction);
    fft2_frame(&mut data.view_mut(), &fft0, &fft1);
    if direction == FftDirection::Inverse {
        let norm = 1.0 / (n0 * n1) as f64;
        data.mapv_inplace(|c| c * norm);
    }
}

/// In-place 2D FFT over one axis pair of a 4D tensor, applied independently
/// at every position of the other pair.
///
/// The per-position transforms are independent, so the batch is distributed
/// over a rayon parallel-for. Inverse transforms are scaled by `1 / N` where
/// `N` is the product of the transformed pair's lengths.
pub fn fft2_pair(data: &mut Array4<Complex64>, pair: AxisPair, direction: FftDirection) {
    let (s0, s1, d0, d1) = data.dim();
    let mut planner = FftPlanner::new();
    match pair {
        AxisPair::Detector => {
            let fft0 = planner.plan_fft(d0, direction);
            let fft1 = planner.plan_fft(d1, direction);
            data.axis_iter_mut(Axis(0))
                .into_par_iter()
                .for_each(|mut block| {
                    for j in 0..s1 {
                        let mut frame = block.slice_mut(s![j, .., ..]);
                        fft2_frame(&mut frame, &fft0, &fft1);
                    }
                });
        }
        AxisPair::Scan => {
            let fft0 = planner.plan_fft(s0, direction);
            let fft1 = planner.plan_fft(s1, direction);
            data.axis_iter_mut(Axis(2))
                .into_par_iter()
                .for_each(|mut block| {
                    for j in 0..d1 {
                        let mut frame = block.slice_mut(s![.., .., j]);
                        fft2_frame(&mut frame, &fft0, &fft1);
                    }
                });
        }
    }
    if direction == FftDirection::Inverse {
        let n = match pair {
            AxisPair::Detector => d0 * d1,
            AxisPair::Scan => s0 * s1,
        };
        let norm = 1.0 / n as f64;
        data.par_mapv_inplace(|c| c * norm);
    }
}

/// Moves the zero-frequency bin of a 2D tensor to index `(n0 / 2, n1 / 2)`.
pub fn fftshift2(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (n0, n1) = data.dim();
    Array2::from_shape_fn((n0, n1), |(i, j)| {
        data[((i + (n0 + 1) / 2) % n0, (j + (n1 + 1) / 2) % n1)]
    })
}

/// Exact inverse of [`fftshift2`].
pub fn ifftshift2(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (n0, n1) = data.dim();
    Array2::from_shape_fn((n0, n1), |(i, j)| data[((i + n0 / 2) % n0, (j + n1 / 2) % n1)])
}

/// Centering shift over one axis pair of a 4D tensor; the other pair is left
/// untouched.
pub fn fftshift4(data: &Array4<Complex64>, pair: AxisPair) -> Array4<Complex64> {
    let (s0, s1, d0, d1) = data.dim();
    match pair {
        AxisPair::Scan => Array4::from_shape_fn((s0, s1, d0, d1), |(a, b, c, d)| {
            data[((a + (s0 + 1) / 2) % s0, (b + (s1 + 1) / 2) % s1, c, d)]
        }),
        AxisPair::Detector => Array4::from_shape_fn((s0, s1, d0, d1), |(a, b, c, d)| {
            data[(a, b, (c + (d0 + 1) / 2) % d0, (d + (d1 + 1) / 2) % d1)]
        }),
    }
}

/// Exact inverse of [`fftshift4`] over the same axis pair.
pub fn ifftshift4(data: &Array4<Complex64>, pair: AxisPair) -> Array4<Complex64> {
    let (s0, s1, d0, d1) = data.dim();
    match pair {
        AxisPair::Scan => Array4::from_shape_fn((s0, s1, d0, d1), |(a, b, c, d)| {
            data[((a + s0 / 2) % s0, (b + s1 / 2) % s1, c, d)]
        }),
        AxisPair::Detector => Array4::from_shape_fn((s0, s1, d0, d1), |(a, b, c, d)| {
            data[(a, b, (c + d0 / 2) % d0, (d + d1 / 2) % d1)]
        }),
    }
}

/// Shifts a 2D complex field by a continuous `(dy, dx)` offset using bilinear
/// interpolation.
///
/// The shift is non-circular: samples pulled from outside the input domain
/// are zero, so energy leaving one edge does not wrap around to the other.
/// Integer offsets reproduce the input exactly (minus the part shifted out of
/// frame).
pub fn shift2(input: &Array2<Complex64>, shift: (f64, f64)) -> Array2<Complex64> {
    let (n0, n1) = input.dim();
    let sample = |y: isize, x: isize| -> Complex64 {
        if y < 0 || x < 0 || y >= n0 as isize || x >= n1 as isize {
            Complex64::new(0.0, 0.0)
        } else {
            input[(y as usize, x as usize)]
        }
    };
    Array2::from_shape_fn((n0, n1), |(i, j)| {
        let y = i as f64 - shift.0;
        let x = j as f64 - shift.1;
        let y0 = y.floor();
        let x0 = x.floor();
        let fy = y - y0;
        let fx = x - x0;
        let (y0, x0) = (y0 as isize, x0 as isize);
        sample(y0, x0) * ((1.0 - fy) * (1.0 - fx))
            + sample(y0, x0 + 1) * ((1.0 - fy) * fx)
            + sample(y0 + 1, x0) * (fy * (1.0 - fx))
            + sample(y0 + 1, x0 + 1) * (fy * fx)
    })
}
