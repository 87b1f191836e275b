//! Overlap-add zero-phase FIR convolution.
//!
//! Zero phase comes from shifting the output left by `(N-1)/2` samples of a
//! symmetric kernel, not from filtering twice. Edge transients are damped by
//! reflect-limited padding of `N-1` samples on each side.
use std::sync::Arc;

use ndarray::{Array2, ArrayView1};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{Error, Result};
use crate::model::AnalogSignal;

use super::design::{design, FilterBand};

/// A kernel with its FFT plans, reusable across channels of equal length.
pub struct FirFilter {
    h_len: usize,
    n_fft: usize,
    h_fft: Vec<Complex<f64>>,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl FirFilter {
    /// Plan the convolution of an odd-length kernel `h` with signals of `n_x` samples.
    pub fn new(h: &[f64], n_x: usize) -> Result<Self> {
        if h.len() % 2 == 0 {
            return Err(Error::InvalidFilter(format!("kernel length must be odd, got {}", h.len())));
        }
        let n_edge = h.len() - 1;
        let n_fft = choose_fft_len(h.len(), n_x + 2 * n_edge);

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft = zero_padded(h, n_fft);
        fwd.process(&mut h_fft);

        Ok(Self { h_len: h.len(), n_fft, h_fft, fwd, inv })
    }

    /// Filter one channel; the output has the length of `x`.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        let n_x = x.len();
        if n_x == 0 {
            return vec![];
        }
        let shift = (self.h_len - 1) / 2;
        let n_edge = self.h_len - 1;

        let x_ext = reflect_limited_pad(x, n_edge, n_edge);
        let n_ext = x_ext.len();
        let n_seg = self.n_fft - self.h_len + 1;
        let inv_scale = 1.0 / self.n_fft as f64;
        let mut y = vec![0.0_f64; n_ext];

        for start in (0..n_ext).step_by(n_seg) {
            let stop = (start + n_seg).min(n_ext);
            let mut buf = zero_padded(&x_ext[start..stop], self.n_fft);
            self.fwd.process(&mut buf);
            for (b, &hf) in buf.iter_mut().zip(&self.h_fft) {
                *b *= hf;
            }
            self.inv.process(&mut buf);

            // Accumulate, shifted left by the kernel's group delay.
            let out_start = start.saturating_sub(shift);
            let prod_start = shift.saturating_sub(start);
            let out_end = (out_start + self.n_fft - prod_start).min(n_ext);
            for (o, p) in (out_start..out_end).zip(prod_start..) {
                y[o] += buf[p].re * inv_scale;
            }
        }

        y[n_edge..n_edge + n_x].to_vec()
    }
}

/// Filter every channel of `data` (`[C, T]`) in place.
pub fn apply_fir_zero_phase(data: &mut Array2<f32>, h: &[f64]) -> Result<()> {
    let fir = FirFilter::new(h, data.ncols())?;
    for mut row in data.rows_mut() {
        let x: Vec<f64> = row.iter().map(|&v| v as f64).collect();
        let y: Vec<f32> = fir.apply(&x).into_iter().map(|v| v as f32).collect();
        row.assign(&ArrayView1::from(&y));
    }
    Ok(())
}

/// Filter a signal with a designed FIR kernel; the result keeps the input's
/// time base, units and annotations.
///
/// # Examples
///
/// ```
/// use ephys::{filter_signal, AnalogSignal, FilterBand};
/// use ndarray::Array2;
///
/// let sig = AnalogSignal::new("lfp", Array2::from_elem((2, 2048), 1.0_f32), 256.0).unwrap();
/// let out = filter_signal(&sig, FilterBand::Lowpass(30.0), None).unwrap();
/// assert_eq!(out.data.dim(), (2, 2048));
/// ```
pub fn filter_signal(signal: &AnalogSignal, band: FilterBand, length: Option<usize>) -> Result<AnalogSignal> {
    let h = design(band, signal.sampling_rate, length)?;
    let mut data = signal.data.clone();
    apply_fir_zero_phase(&mut data, &h)?;
    Ok(signal.with_data(format!("{}_filtered", signal.name), data))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn zero_padded(x: &[f64], n: usize) -> Vec<Complex<f64>> {
    x.iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n)
        .collect()
}

/// Reflect-limited padding.
///
/// Left:  `pad[i] = 2*x[0] - x[i]`         for i in 1..=n_l
/// Right: `pad[i] = 2*x[-1] - x[-(i+1)]`   for i in 1..=n_r
///
/// Padding longer than the signal is filled with zeros on the outside.
pub(super) fn reflect_limited_pad(x: &[f64], n_l: usize, n_r: usize) -> Vec<f64> {
    let n = x.len();
    let actual_l = n_l.min(n - 1);
    let actual_r = n_r.min(n - 1);

    let mut out = Vec::with_capacity(n_l + n + n_r);
    out.resize(n_l - actual_l, 0.0);
    out.extend((1..=actual_l).rev().map(|i| 2.0 * x[0] - x[i]));
    out.extend_from_slice(x);
    let last = x[n - 1];
    out.extend((1..=actual_r).map(|i| 2.0 * last - x[n - 1 - i]));
    out.resize(n_l + n + n_r, 0.0);
    out
}

/// Power-of-two FFT size minimising
/// `ceil(n_x / (N - n_h + 1)) · N · (log2 N + 1) + 4e-5 · N · n_x`.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let max_pow = (n_x as f64).log2().ceil() as u32 + 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;

    let mut best_n = 1_usize << max_pow.max(min_pow);
    let mut best_cost = f64::INFINITY;
    for pow in min_pow..=max_pow {
        let n = 1_usize << pow;
        if n < min_fft {
            continue;
        }
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
            + 4e-5 * n as f64 * n_x as f64;
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }
    best_n
}
