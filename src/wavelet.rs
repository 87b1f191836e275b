//! Morlet wavelet transform at a single center frequency.
//!
//! The wavelet is defined directly in the frequency domain
//! (Le Van Quyen et al., J Neurosci Meth 111:83-98, 2001):
//!
//! ```text
//! σ      = n_cycles / (6 f)
//! Ψ̂(ν)   = √(2π f) · σ · exp(−2 (π σ (ν − f))²) · H(ν) · fs
//! ```
//!
//! with `H` the Heaviside step, so the output is analytic: its magnitude is
//! the instantaneous amplitude at `f`. The convolution runs through one FFT
//! per channel.
use log::debug;
use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::WaveletConfig;
use crate::error::{Error, Result};
use crate::model::AnalogSignal;

/// Frequency-domain Morlet wavelet for an FFT of length `n`.
fn morlet_ft(frequency: f64, n_cycles: f64, fs: f64, n: usize) -> Vec<f64> {
    let sigma = n_cycles / (6.0 * frequency);
    let norm = (2.0 * std::f64::consts::PI * frequency).sqrt() * sigma * fs;
    (0..n)
        .map(|k| {
            // Bin order: 0, 1, …, ⌈n/2⌉-1, then the negative frequencies.
            let ki = if k < n.div_ceil(2) { k as f64 } else { k as f64 - n as f64 };
            let nu = ki * fs / n as f64;
            if nu > 0.0 {
                let x = std::f64::consts::PI * sigma * (nu - frequency);
                norm * (-2.0 * x * x).exp()
            } else {
                0.0
            }
        })
        .collect()
}

/// Complex wavelet coefficients of each channel, shape `[C, T]`.
///
/// # Errors
///
/// [`Error::InvalidParameter`] when `frequency` is outside
/// `(0, sampling_rate/2)`, `n_cycles` is not positive, or the signal is empty.
pub fn wavelet_transform(
    signal: &AnalogSignal,
    frequency: f64,
    cfg: &WaveletConfig,
) -> Result<Array2<Complex<f64>>> {
    let fs = signal.sampling_rate;
    if !(frequency.is_finite() && frequency > 0.0 && frequency < fs / 2.0) {
        return Err(Error::InvalidParameter(format!(
            "frequency {frequency} Hz must lie strictly between 0 and half the sampling rate ({} Hz)",
            fs / 2.0
        )));
    }
    if !(cfg.n_cycles.is_finite() && cfg.n_cycles > 0.0) {
        return Err(Error::InvalidParameter(format!("n_cycles must be positive, got {}", cfg.n_cycles)));
    }
    let n_orig = signal.n_samples();
    if n_orig == 0 {
        return Err(Error::InvalidParameter(format!("signal '{}' has no samples", signal.name)));
    }

    let n = if cfg.zero_padding {
        // Next power of two strictly above the length.
        1usize << (usize::BITS - n_orig.leading_zeros())
    } else {
        n_orig
    };
    debug!("wavelet: {} ch × {n_orig} samples, fft length {n}, f={frequency} Hz", signal.n_channels());

    let psi = morlet_ft(frequency, cfg.n_cycles, fs, n);
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fwd = planner.plan_fft_forward(n);
    let inv = planner.plan_fft_inverse(n);
    let inv_scale = 1.0 / n as f64;

    let mut out = Array2::<Complex<f64>>::zeros((signal.n_channels(), n_orig));
    for (row, mut out_row) in signal.data.rows().into_iter().zip(out.rows_mut()) {
        let mut buf: Vec<Complex<f64>> = row
            .iter()
            .map(|&v| Complex { re: v as f64, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(n)
            .collect();
        fwd.process(&mut buf);
        for (b, &p) in buf.iter_mut().zip(&psi) {
            *b *= p;
        }
        inv.process(&mut buf);
        for (o, b) in out_row.iter_mut().zip(&buf) {
            *o = *b * inv_scale;
        }
    }
    Ok(out)
}

/// Magnitude of the wavelet transform as a signal with the input's time base.
pub fn wavelet_amplitude(signal: &AnalogSignal, frequency: f64, cfg: &WaveletConfig) -> Result<AnalogSignal> {
    let coeffs = wavelet_transform(signal, frequency, cfg)?;
    let amp = coeffs.mapv(|c| c.norm() as f32);
    let mut out = signal.with_data(format!("{}_wavelet_{frequency}Hz", signal.name), amp);
    out.annotations.insert("wavelet_frequency_hz".into(), frequency.to_string());
    out.annotations.insert("wavelet_n_cycles".into(), cfg.n_cycles.to_string());
    Ok(out)
}
